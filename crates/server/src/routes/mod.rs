pub mod health;
pub mod sites;
pub mod sponsors;
pub mod trials;
