//! Remote command dispatch and status polling

pub mod channel;
pub mod clock;
pub mod dry_run;
pub mod fsm;
pub mod poller;

pub use channel::{
    ExecutionChannel, Invocation, InvocationPoll, RemoteStatus, SendCommand, RUN_SHELL_SCRIPT,
};
pub use clock::{Clock, ManualClock, TokioClock};
pub use dry_run::DryRunChannel;
pub use fsm::{PollEvent, PollFsm, PollState};
pub use poller::{send_and_wait, PollOptions, DEFAULT_POLL_INTERVAL};
