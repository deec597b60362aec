pub mod fake_bus;
