//! Actors that live and die together.
//!
//! Each actor is a `run` future paired with an `interrupt` callback. All
//! actors run concurrently; as soon as any of them returns, every interrupt
//! is invoked exactly once with that actor's error (if it failed). The group
//! then waits for the remaining actors and resolves to the first error in
//! completion order, or `Ok(())` if none failed.

use std::fmt::Display;
use std::future::Future;

use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};

type Interrupt<'a, E> = Box<dyn FnOnce(Option<&E>) + Send + 'a>;

struct Actor<'a, E> {
    name: &'static str,
    run: BoxFuture<'a, Result<(), E>>,
    interrupt: Interrupt<'a, E>,
}

pub struct Group<'a, E> {
    actors: Vec<Actor<'a, E>>,
}

impl<'a, E> Default for Group<'a, E> {
    fn default() -> Self {
        Self { actors: Vec::new() }
    }
}

impl<'a, E> Group<'a, E>
where
    E: Display + Send + 'a,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an actor. `interrupt` must make `run` return promptly.
    pub fn add<R, I>(&mut self, name: &'static str, run: R, interrupt: I)
    where
        R: Future<Output = Result<(), E>> + Send + 'a,
        I: FnOnce(Option<&E>) + Send + 'a,
    {
        self.actors.push(Actor {
            name,
            run: Box::pin(run),
            interrupt: Box::new(interrupt),
        });
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Runs all actors until every one of them has returned.
    pub async fn run(self) -> Result<(), E> {
        let mut interrupts = Vec::with_capacity(self.actors.len());
        let mut running = FuturesUnordered::new();
        for actor in self.actors {
            let name = actor.name;
            let run = actor.run;
            running.push(async move { (name, run.await) });
            interrupts.push(actor.interrupt);
        }

        let Some((name, first)) = running.next().await else {
            return Ok(());
        };
        match &first {
            Ok(()) => log::info!("{} stopped, shutting down", name),
            Err(e) => log::error!("{} failed, shutting down: {}", name, e),
        }

        let first_error = first.err();
        for interrupt in interrupts {
            interrupt(first_error.as_ref());
        }

        let mut result = match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        };
        while let Some((name, outcome)) = running.next().await {
            match outcome {
                Ok(()) => log::debug!("{} stopped", name),
                Err(e) => {
                    log::debug!("{} stopped with error: {}", name, e);
                    if result.is_ok() {
                        result = Err(e);
                    }
                }
            }
        }
        result
    }
}
