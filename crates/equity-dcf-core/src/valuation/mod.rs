pub mod assumptions;
pub mod dcf;
pub mod sensitivity;
