// Library root
// ------------
// This crate exposes the record store behind the `job-seeker` binary.
// The binary (`main.rs`) parses arguments, opens both stores and hands
// the resolved command to `ui::run`.
//
// Module responsibilities:
// - `record`: the `Job` and `Poc` types and the `; `-delimited line codec.
// - `store`: one flat file per record type (load, search, number
//   allocation, append, update, delete).
// - `prompt` / `builder`: collecting field values from the user.
// - `config`: where the data files live.
// - `cli`: argument parsing and resolution into a `Command`.
// - `ui`: running a command and writing what the user sees.
pub mod builder;
pub mod cli;
pub mod config;
pub mod prompt;
pub mod record;
pub mod store;
pub mod ui;
