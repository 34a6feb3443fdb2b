pub mod analysis;
#[cfg(feature = "comparison")]
pub mod comparison;
pub mod effective_rate;
pub mod model;
#[cfg(feature = "sequence")]
pub mod sequence;
pub mod single;

pub use model::{
    MortgageModel, MortgageOverview, MortgageSummary, PaymentProgress, PeriodSummary, ScheduleRow,
};
#[cfg(feature = "sequence")]
pub use sequence::{MortgageSequence, PeriodSpec, SequenceInput};
pub use single::{Mortgage, MortgageInput};
