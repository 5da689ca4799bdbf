//! Headless game client: RPC stubs, interpolation and session state

pub mod interp;
pub mod rpc;
pub mod session;

pub use rpc::{ClientError, RpcClient};
pub use session::{run_network_loop, ClientSession, LocalPlayer};
