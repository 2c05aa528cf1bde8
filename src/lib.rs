mod ai;
mod bitboard;
mod board;
mod clock;
mod common;
mod config;
mod events;
mod game;
#[cfg(feature = "runtime")]
mod logging;
mod placement;
mod player;
mod player_ai;
pub mod protocol;
#[cfg(feature = "runtime")]
pub mod runtime;
mod session;
mod ship;
mod stats;
mod sync;
#[cfg(feature = "runtime")]
pub mod transport;

pub use ai::*;
pub use bitboard::{BitBoard, BitBoardError};
pub use board::*;
pub use clock::*;
pub use common::*;
pub use config::*;
pub use events::GameEvent;
pub use game::*;
#[cfg(feature = "runtime")]
pub use logging::init_logging;
pub use placement::*;
pub use player::*;
pub use player_ai::*;
pub use protocol::{OutboundMessage, RemoteEvent};
#[cfg(feature = "runtime")]
pub use runtime::{Command, RunnerHandle, SessionRunner};
pub use session::*;
pub use ship::*;
pub use stats::*;
#[cfg(feature = "runtime")]
pub use transport::{AuthorityEnd, InMemoryTransport, Transport};
