#![forbid(unsafe_code)]

mod core;
mod game;
mod indexes;
mod journal;
mod notifications;
mod pragmas;

pub(super) fn full_schema_sql() -> String {
    let mut sql = String::new();
    sql.push_str(pragmas::SQL);
    sql.push_str(core::SQL);
    sql.push_str(journal::SQL);
    sql.push_str(notifications::SQL);
    sql.push_str(game::SQL);
    sql.push_str(indexes::SQL);
    sql
}
