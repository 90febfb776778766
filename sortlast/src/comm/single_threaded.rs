// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::comm::{Communicator, DataMessage, Expected, ResultMessage};
use crate::error::{CompositeError, Result};

/// A world consisting of a single rank.
///
/// Every region is owned by this rank, so patches never leave it: the router composites
/// them locally and nothing is ever sent.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalCommunicator;

impl LocalCommunicator {
    /// Create a new single-rank communicator.
    pub fn new() -> Self {
        Self
    }
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn exchange_counts(&self, _pass: u64, _outgoing: &[usize]) -> Result<Expected> {
        Ok(Expected::new(0))
    }

    fn send_data(&self, dest: usize, _msg: DataMessage) -> Result<()> {
        match dest {
            0 => Err(CompositeError::Protocol(
                "a single rank never sends patches to itself".into(),
            )),
            _ => Err(CompositeError::RankOutOfRange {
                rank: dest,
                size: 1,
            }),
        }
    }

    fn recv_data(&self, expected: Expected) -> Result<Vec<DataMessage>> {
        if expected.count() != 0 {
            return Err(CompositeError::Protocol(format!(
                "a single rank can't receive {} patches",
                expected.count()
            )));
        }

        Ok(Vec::new())
    }

    fn send_result(&self, _msg: ResultMessage) -> Result<()> {
        Err(CompositeError::Protocol(
            "the root rank doesn't send results to itself".into(),
        ))
    }

    fn gather_results(&self) -> Result<Vec<ResultMessage>> {
        Ok(Vec::new())
    }

    fn barrier(&self) -> Result<()> {
        Ok(())
    }
}
