// 同階層のファイルをモジュールとしてインポート
pub mod config;
pub mod error;
pub mod harness; // endpoint calls + sequential run
pub mod report;
pub mod request;
pub mod state; // BattleState + reference scenarios
pub mod transport;
pub mod unwrap;

pub use config::Config;
pub use error::ClientError;
pub use harness::{run_all, RunSummary};
pub use report::Reporter;
pub use state::{BattleState, Payload, Scenario};
pub use unwrap::{ChatReply, DecisionResult};
