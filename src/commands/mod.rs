pub mod klines;
