/*
 * Responsibility
 * - greet proxy の response DTO
 */
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct GreetingResponse {
    pub greeting: String,
}
