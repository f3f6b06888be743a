//! Simulation error types.

use std::io;

/// Errors that can occur while driving a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// An `Unknown` node was reached; simulation has no value for it.
    #[error("cannot evaluate a symbolic unknown during simulation")]
    Unknown,

    /// A memory was accessed past its last cell.
    ///
    /// Only raised in the default strict mode; see
    /// [`Simulation::wrap_addresses`](crate::Simulation::wrap_addresses).
    #[error("memory address {address} out of bounds for size {size}")]
    MemoryOutOfBounds {
        /// The decoded address.
        address: u64,
        /// The memory size in cells.
        size: u64,
    },

    /// The input vector length does not match the module's input count.
    #[error("expected {expected} input values, got {found}")]
    InputCount {
        /// The module's input count.
        expected: usize,
        /// The number of values supplied.
        found: usize,
    },

    /// An input value has the wrong width.
    #[error("input {name:?} is {expected} bits wide, got {found}")]
    InputWidth {
        /// The input port name.
        name: String,
        /// The declared width.
        expected: usize,
        /// The supplied width.
        found: usize,
    },

    /// A named input vector is missing one of the module's inputs.
    #[error("no value supplied for input {name:?}")]
    MissingInput {
        /// The input port name.
        name: String,
    },

    /// An I/O error occurred while writing waveform data.
    #[error("waveform I/O error: {0}")]
    WaveformIo(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_display() {
        assert_eq!(
            SimError::Unknown.to_string(),
            "cannot evaluate a symbolic unknown during simulation"
        );
    }

    #[test]
    fn memory_out_of_bounds_display() {
        let e = SimError::MemoryOutOfBounds {
            address: 40,
            size: 32,
        };
        assert_eq!(e.to_string(), "memory address 40 out of bounds for size 32");
    }

    #[test]
    fn input_errors_display() {
        let e = SimError::InputCount {
            expected: 2,
            found: 1,
        };
        assert_eq!(e.to_string(), "expected 2 input values, got 1");
        let e = SimError::InputWidth {
            name: "clk".into(),
            expected: 1,
            found: 4,
        };
        assert_eq!(e.to_string(), "input \"clk\" is 1 bits wide, got 4");
    }
}
