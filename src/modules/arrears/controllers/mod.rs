mod arrears_controller;

pub use arrears_controller::*;
