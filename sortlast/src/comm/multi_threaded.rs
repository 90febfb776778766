// Copyright 2025 the Sortlast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::comm::{Communicator, DataMessage, Expected, MessageKind, ROOT, ResultMessage};
use crate::error::{CompositeError, Result};
use core::fmt::{Debug, Formatter};
use crossbeam_channel::{Receiver, Sender};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::{Arc, Barrier};

#[derive(Debug)]
struct CountMessage {
    pass: u64,
    source: usize,
    count: usize,
}

/// One rank of a [`ThreadWorld`].
///
/// Each rank owns the receiving end of one channel per message kind and holds senders
/// to the channels of every rank. All channels are unbounded, so sends never block and
/// issuing every send before draining the receives can't deadlock.
pub struct ThreadCommunicator {
    rank: usize,
    size: usize,
    count_senders: Vec<Sender<CountMessage>>,
    count_receiver: Receiver<CountMessage>,
    data_senders: Vec<Sender<DataMessage>>,
    data_receiver: Receiver<DataMessage>,
    result_sender: Sender<ResultMessage>,
    // Only the root rank receives results.
    result_receiver: Option<Receiver<ResultMessage>>,
    barrier: Arc<Barrier>,
}

impl ThreadCommunicator {
    fn check_dest(&self, dest: usize) -> Result<()> {
        if dest >= self.size {
            return Err(CompositeError::RankOutOfRange {
                rank: dest,
                size: self.size,
            });
        }
        if dest == self.rank {
            return Err(CompositeError::Protocol(format!(
                "rank {dest} attempted to send a patch to itself"
            )));
        }

        Ok(())
    }
}

impl Communicator for ThreadCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn exchange_counts(&self, pass: u64, outgoing: &[usize]) -> Result<Expected> {
        if outgoing.len() != self.size {
            return Err(CompositeError::Protocol(format!(
                "expected outgoing counts for {} ranks, got {}",
                self.size,
                outgoing.len()
            )));
        }

        for (dest, &count) in outgoing.iter().enumerate() {
            if dest == self.rank {
                continue;
            }

            self.count_senders[dest]
                .send(CountMessage {
                    pass,
                    source: self.rank,
                    count,
                })
                .map_err(|_| CompositeError::Disconnected(MessageKind::Count))?;
        }

        let mut total = 0;
        for _ in 1..self.size {
            let msg = self
                .count_receiver
                .recv()
                .map_err(|_| CompositeError::Disconnected(MessageKind::Count))?;

            if msg.pass != pass {
                return Err(CompositeError::Protocol(format!(
                    "rank {} announced patches for pass {}, but rank {} is in pass {pass}",
                    msg.source, msg.pass, self.rank
                )));
            }

            total += msg.count;
        }

        Ok(Expected::new(total))
    }

    fn send_data(&self, dest: usize, msg: DataMessage) -> Result<()> {
        self.check_dest(dest)?;

        self.data_senders[dest]
            .send(msg)
            .map_err(|_| CompositeError::Disconnected(MessageKind::Data))
    }

    fn recv_data(&self, expected: Expected) -> Result<Vec<DataMessage>> {
        (0..expected.count())
            .map(|_| {
                self.data_receiver
                    .recv()
                    .map_err(|_| CompositeError::Disconnected(MessageKind::Data))
            })
            .collect()
    }

    fn send_result(&self, msg: ResultMessage) -> Result<()> {
        if self.rank == ROOT {
            return Err(CompositeError::Protocol(
                "the root rank doesn't send results to itself".into(),
            ));
        }

        self.result_sender
            .send(msg)
            .map_err(|_| CompositeError::Disconnected(MessageKind::Result))
    }

    fn gather_results(&self) -> Result<Vec<ResultMessage>> {
        let Some(receiver) = &self.result_receiver else {
            return Err(CompositeError::Protocol(format!(
                "rank {} attempted to gather results, but only the root rank can",
                self.rank
            )));
        };

        (1..self.size)
            .map(|_| {
                receiver
                    .recv()
                    .map_err(|_| CompositeError::Disconnected(MessageKind::Result))
            })
            .collect()
    }

    fn barrier(&self) -> Result<()> {
        self.barrier.wait();
        Ok(())
    }
}

impl Debug for ThreadCommunicator {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ThreadCommunicator")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// A set of ranks running as threads of a dedicated thread pool.
///
/// The pool has exactly one thread per rank, so a rank blocked in a receive never
/// keeps another rank from running.
pub struct ThreadWorld {
    comms: Vec<ThreadCommunicator>,
    thread_pool: ThreadPool,
}

impl ThreadWorld {
    /// Create a world of `size` connected ranks.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(CompositeError::NoRanks);
        }

        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|idx| format!("sortlast-rank-{idx}"))
            .build()?;

        let (count_senders, count_receivers): (Vec<_>, Vec<_>) =
            (0..size).map(|_| crossbeam_channel::unbounded()).unzip();
        let (data_senders, data_receivers): (Vec<_>, Vec<_>) =
            (0..size).map(|_| crossbeam_channel::unbounded()).unzip();
        let (result_sender, result_receiver) = crossbeam_channel::unbounded();
        let barrier = Arc::new(Barrier::new(size));

        let comms = count_receivers
            .into_iter()
            .zip(data_receivers)
            .enumerate()
            .map(|(rank, (count_receiver, data_receiver))| ThreadCommunicator {
                rank,
                size,
                count_senders: count_senders.clone(),
                count_receiver,
                data_senders: data_senders.clone(),
                data_receiver,
                result_sender: result_sender.clone(),
                result_receiver: (rank == ROOT).then(|| result_receiver.clone()),
                barrier: barrier.clone(),
            })
            .collect();

        log::debug!("created a thread world with {size} ranks");

        Ok(Self { comms, thread_pool })
    }

    /// The number of ranks.
    pub fn size(&self) -> usize {
        self.comms.len()
    }

    /// Run `op` once on every rank, concurrently, and return the results in rank order.
    ///
    /// A rank that panics leaves its peers blocked in their next receive; there is no
    /// timeout.
    pub fn run<R: Send>(&self, op: impl Fn(&ThreadCommunicator) -> R + Sync) -> Vec<R> {
        let comms = &self.comms;
        self.thread_pool.broadcast(|ctx| op(&comms[ctx.index()]))
    }
}

impl Debug for ThreadWorld {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str("ThreadWorld { .. }")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortlast_common::buffer::ImageBuffer;
    use sortlast_common::extents::Extents;
    use sortlast_common::patch::{ImagePatch, PatchId};

    fn patch_for(rank: usize) -> ImagePatch {
        ImagePatch::new(
            PatchId::new(rank, 0),
            rank as f32,
            ImageBuffer::new(Extents::new(0, 1, 0, 1)),
        )
    }

    #[test]
    fn world_rejects_zero_ranks() {
        assert!(matches!(ThreadWorld::new(0), Err(CompositeError::NoRanks)));
    }

    #[test]
    fn world_runs_every_rank_once() {
        let world = ThreadWorld::new(5).unwrap();
        let ranks = world.run(|comm| (comm.rank(), comm.size()));
        assert_eq!(ranks, (0..5).map(|r| (r, 5)).collect::<Vec<_>>());
    }

    #[test]
    fn exchange_then_receive_ring() {
        let world = ThreadWorld::new(4).unwrap();
        let received = world.run(|comm| {
            let next = (comm.rank() + 1) % comm.size();
            let mut outgoing = vec![0; comm.size()];
            outgoing[next] = 1;

            let expected = comm.exchange_counts(7, &outgoing).unwrap();
            assert_eq!(expected.count(), 1);

            comm.send_data(
                next,
                DataMessage {
                    pass: 7,
                    region: next,
                    patch: patch_for(comm.rank()),
                },
            )
            .unwrap();

            let msgs = comm.recv_data(expected).unwrap();
            msgs[0].patch.id().rank
        });

        assert_eq!(received, [3, 0, 1, 2]);
    }

    #[test]
    fn exchange_detects_pass_mismatch() {
        let world = ThreadWorld::new(2).unwrap();
        let results = world.run(|comm| comm.exchange_counts(comm.rank() as u64, &[0, 0]));
        assert!(results
            .iter()
            .all(|r| matches!(r, Err(CompositeError::Protocol(_)))));
    }

    #[test]
    fn send_to_self_is_rejected() {
        let world = ThreadWorld::new(2).unwrap();
        let results = world.run(|comm| {
            let msg = DataMessage {
                pass: 0,
                region: comm.rank(),
                patch: patch_for(comm.rank()),
            };
            comm.send_data(comm.rank(), msg)
        });
        assert!(results
            .iter()
            .all(|r| matches!(r, Err(CompositeError::Protocol(_)))));
    }

    #[test]
    fn only_root_gathers() {
        use crate::comm::RegionPayload;

        let world = ThreadWorld::new(3).unwrap();
        let results = world.run(|comm| {
            if comm.rank() == ROOT {
                let mut sources: Vec<_> = comm
                    .gather_results()
                    .unwrap()
                    .into_iter()
                    .map(|msg| msg.source)
                    .collect();
                sources.sort_unstable();
                sources
            } else {
                assert!(matches!(
                    comm.gather_results(),
                    Err(CompositeError::Protocol(_))
                ));
                comm.send_result(ResultMessage {
                    pass: 0,
                    region: comm.rank(),
                    source: comm.rank(),
                    payload: RegionPayload::Empty,
                })
                .unwrap();
                vec![]
            }
        });

        assert_eq!(results[0], [1, 2]);
    }
}
