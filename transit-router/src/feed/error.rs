//! Feed input error types.

/// Errors in a feed's content.
///
/// These are input errors: they describe a malformed feed, not a defect in
/// the graph. Whether one aborts the whole build or only skips the feed is
/// decided by the builder's input error policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// A stop time references a stop that is not in the feed
    #[error("trip {trip} references unknown stop {stop}")]
    UnknownStop { trip: String, stop: String },

    /// A trip has fewer than two stop times and cannot be ridden
    #[error("trip {0} has fewer than two stop times")]
    TooFewStopTimes(String),

    /// Scheduled times go backwards along a trip
    #[error("trip {trip} goes back in time at stop sequence {sequence}")]
    TimeRegression { trip: String, sequence: u32 },

    /// A stop time has neither an arrival nor a departure time
    #[error("trip {trip} has no time at stop sequence {sequence}")]
    MissingTime { trip: String, sequence: u32 },

    /// A minimum-time transfer without a duration
    #[error("transfer {from} -> {to} has no minimum transfer time")]
    MissingTransferTime { from: String, to: String },

    /// The feed archive could not be read
    #[error("failed to read feed: {0}")]
    Read(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FeedError::UnknownStop {
            trip: "T1".into(),
            stop: "S9".into(),
        };
        assert_eq!(err.to_string(), "trip T1 references unknown stop S9");

        let err = FeedError::TooFewStopTimes("T2".into());
        assert_eq!(err.to_string(), "trip T2 has fewer than two stop times");

        let err = FeedError::TimeRegression {
            trip: "T3".into(),
            sequence: 4,
        };
        assert_eq!(
            err.to_string(),
            "trip T3 goes back in time at stop sequence 4"
        );

        let err = FeedError::MissingTransferTime {
            from: "A".into(),
            to: "B".into(),
        };
        assert_eq!(
            err.to_string(),
            "transfer A -> B has no minimum transfer time"
        );
    }
}
