pub mod runway;
