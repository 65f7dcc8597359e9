pub mod recognition;
