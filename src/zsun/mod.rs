pub mod riders;
