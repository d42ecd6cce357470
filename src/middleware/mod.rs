/*
 * Responsibility
 * - middleware の公開インターフェース (re-export)
 * - cors::apply(...), http::apply(...) を app.rs から使う
 */
pub mod cors;
pub mod http;
