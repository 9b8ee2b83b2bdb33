pub mod btts;
pub mod commentary;
pub mod config;
pub mod error;
pub mod export;
pub mod fatigue;
pub mod lambda;
pub mod momentum;
pub mod monte_carlo;
pub mod occasion;
pub mod payload;
pub mod session;
pub mod sim_config;
pub mod simulator;
pub mod state;
pub mod stats;
pub mod store;
pub mod tactics;
pub mod trace;
pub mod worker;
