pub mod assumptions;
pub mod valuation;
