//! Agent System
//!
//! Agents wrap a language-model interaction behind a deterministic contract.
//!
//! - **Proposal Agent**: suggests dashboard widgets for a profiled dataset,
//!   falling back to fixed rules when the model is unavailable or unhelpful
//!
//! ```text
//! columns + hints + domain/intent
//!      │
//!      ▼
//! ┌─────────────┐    call / parse / validate fails
//! │  Proposal   │ ─────────────────────────────────┐
//! │   Agent     │                                  ▼
//! └─────────────┘                          ┌──────────────┐
//!      │  model proposals (≤ 6)            │   Fallback   │ (≤ 3)
//!      ▼                                   └──────────────┘
//!  WidgetProposal[] ◄──────────────────────────────┘
//! ```

pub mod proposal;

pub use proposal::{ProposalAgent, ProposalOutcome, ProposalSource};
