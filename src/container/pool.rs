// ABOUTME: Ordered group of container handles with concurrent run and remove.
// ABOUTME: One task per member, fanned back in over a channel sized to the pool.

use std::future::Future;

use tokio::sync::mpsc;

use crate::engine::Engine;

use super::error::LifecycleError;
use super::handle::Container;

/// Outcome of one member in a pool-wide operation.
#[derive(Debug)]
pub struct MemberOutcome {
    /// Member name at the time the operation started.
    pub name: String,
    pub result: Result<(), LifecycleError>,
}

/// Per-member results of a pool-wide operation, in completion order.
#[derive(Debug, Default)]
pub struct PoolReport {
    pub outcomes: Vec<MemberOutcome>,
}

impl PoolReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &LifecycleError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name.as_str(), e)))
    }

    /// Collapse to a single result: the last failure observed, if any.
    pub fn into_result(self) -> Result<(), LifecycleError> {
        self.outcomes
            .into_iter()
            .filter_map(|o| o.result.err())
            .last()
            .map_or(Ok(()), Err)
    }
}

/// An ordered collection of container handles.
pub struct Pool<E: Engine> {
    members: Vec<Container<E>>,
}

impl<E: Engine> Pool<E> {
    pub fn new(members: Vec<Container<E>>) -> Self {
        Self { members }
    }

    pub fn push(&mut self, member: Container<E>) {
        self.members.push(member);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Container<E>] {
        &self.members
    }

    pub fn members_mut(&mut self) -> &mut [Container<E>] {
        &mut self.members
    }

    pub fn get(&self, name: &str) -> Option<&Container<E>> {
        self.members.iter().find(|c| c.name() == name)
    }

    pub fn into_members(self) -> Vec<Container<E>> {
        self.members
    }

    /// Run every member concurrently.
    pub async fn run_all(&mut self) -> PoolReport {
        self.fan_out("run", |mut member| async move {
            let result = member.run().await;
            (member, result)
        })
        .await
    }

    /// Remove every member concurrently.
    pub async fn remove_all(&mut self, remove_volumes: bool) -> PoolReport {
        self.fan_out("remove", move |mut member| async move {
            let result = member.remove(remove_volumes).await;
            (member, result)
        })
        .await
    }

    /// Move each member into its own task, wait for exactly one message per
    /// task, then put the members back in their original order.
    ///
    /// A member whose task panics never comes back; it is reported as
    /// `Aborted` and dropped from the pool.
    async fn fan_out<F, Fut>(&mut self, operation: &'static str, op: F) -> PoolReport
    where
        F: Fn(Container<E>) -> Fut,
        Fut: Future<Output = (Container<E>, Result<(), LifecycleError>)> + Send + 'static,
    {
        let members = std::mem::take(&mut self.members);
        let total = members.len();
        let names: Vec<String> = members.iter().map(|m| m.name().to_string()).collect();

        let (tx, mut rx) = mpsc::channel(total.max(1));
        for (index, member) in members.into_iter().enumerate() {
            let tx = tx.clone();
            let fut = op(member);
            tokio::spawn(async move {
                let (member, result) = fut.await;
                // Capacity equals the number of senders, so this never waits.
                let _ = tx.send((index, member, result)).await;
            });
        }
        drop(tx);

        let mut returned: Vec<Option<Container<E>>> = (0..total).map(|_| None).collect();
        let mut report = PoolReport::default();
        while let Some((index, member, result)) = rx.recv().await {
            if let Err(e) = &result {
                tracing::warn!(container = %names[index], operation, error = %e, "pool member failed");
            }
            report.outcomes.push(MemberOutcome {
                name: names[index].clone(),
                result,
            });
            returned[index] = Some(member);
        }

        // The channel closes once every task has finished, reported or not.
        for (index, slot) in returned.iter().enumerate() {
            if slot.is_none() {
                tracing::warn!(container = %names[index], operation, "pool task ended without reporting");
                report.outcomes.push(MemberOutcome {
                    name: names[index].clone(),
                    result: Err(LifecycleError::Aborted {
                        name: names[index].clone(),
                    }),
                });
            }
        }

        self.members = returned.into_iter().flatten().collect();
        report
    }
}

impl<E: Engine> std::fmt::Debug for Pool<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.members.iter()).finish()
    }
}
