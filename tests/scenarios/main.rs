//! Scenario tests over the demo KMM project and synthetic projects

mod helpers;

mod credentials;
mod demo_project;
mod triggers_and_agents;
mod validation;
