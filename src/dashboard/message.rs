//! The message ADT the dashboard's single `Update` entry point consumes
//! (spec.md §4.4.1). Every background command posts exactly one of these on
//! completion and never mutates dashboard state directly.

use std::collections::HashMap;
use std::sync::Arc;

use crossterm::event::{KeyEvent, MouseEvent};

use crate::assembler::AssembleError;
use crate::gateway::error::GatewayError;
use crate::gateway::types::IndexSettingsValues;
use crate::model::Snapshot;

#[derive(Debug, Clone)]
pub enum Message {
    Snapshot(Box<Snapshot>),
    FetchError(AssembleError),
    Tick { gen: u64 },
    CountdownTick { gen: u64 },
    Key(KeyEvent),
    Mouse(MouseEvent),
    WindowSize { width: u16, height: u16 },
    DeleteResult { names: Vec<String>, err: Option<Arc<GatewayError>> },
    SettingsLoaded { values: IndexSettingsValues, err: Option<Arc<GatewayError>>, nonce: u64 },
    SettingsResult { names: Vec<String>, err: Option<Arc<GatewayError>>, nonce: u64 },
}

/// The single outbound side effect `Update` may request; runs on a
/// separate task and posts exactly one [`Message`] on completion
/// (spec.md §5).
#[derive(Debug, Clone)]
pub enum Command {
    Fetch,
    ScheduleTick { delay_ms: u64, gen: u64 },
    ScheduleCountdown { gen: u64 },
    DeleteIndices(Vec<String>),
    LoadSettings { name: String, nonce: u64 },
    SubmitSettings { names: Vec<String>, diff: HashMap<String, Option<String>>, nonce: u64 },
    Quit,
}
