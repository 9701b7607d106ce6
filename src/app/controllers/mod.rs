mod main_controller;

pub use main_controller::{MainController, MainView};
