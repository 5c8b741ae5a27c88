pub mod punto;
