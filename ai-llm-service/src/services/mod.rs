pub mod aider_service;
