pub mod discoverer;
