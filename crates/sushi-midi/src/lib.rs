//! MIDI dispatcher: routing tables, CC/PC bindings, clock generation and
//! wire encode/decode (spec.md §4.E).

pub mod clock;
pub mod codec;
pub mod dispatcher;
pub mod error;
pub mod routing;
pub mod status;

pub use clock::ClockGenerator;
pub use codec::{decode, DecodedMessage};
pub use dispatcher::{absolute_cc_value, relative_cc_delta, MidiDispatcher};
pub use error::{Error, Result};
pub use routing::{CcBinding, KbdReceiver, KbdSender, PcBinding, RoutingTables};
pub use status::ConnectionStatus;
