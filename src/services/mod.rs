pub mod authorizer;
pub mod discovery;
pub mod greetings;
