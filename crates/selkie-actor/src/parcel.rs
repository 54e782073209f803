//! Erased delivery units
//!
//! A parcel is the type-erased box travelling through a mailbox band. The
//! two variants carry a message for a [`Handler`] or a channel destined for
//! the callback directory. Timer firings never enter the mailbox; the
//! dispatcher drives them straight from the timer table.

use crate::actor::{Actor, Handler};
use crate::channel::Channel;
use crate::context::Context;
use crate::retry::Flow;

/// One deliverable unit. Delivery may be repeated: a parcel rejected with a
/// retry signal keeps its payload and is offered to the same handler again.
pub(crate) trait Parcel<R: Actor>: Send {
    fn deliver(&mut self, actor: &mut R, ctx: &mut Context<R>) -> Flow;
}

/// Carries a moved-in value of one message type
pub(crate) struct MessageParcel<M: Send + 'static> {
    payload: M,
}

impl<M: Send + 'static> MessageParcel<M> {
    pub(crate) fn new(payload: M) -> Self {
        Self { payload }
    }
}

impl<R, M> Parcel<R> for MessageParcel<M>
where
    R: Handler<M>,
    M: Send + 'static,
{
    fn deliver(&mut self, actor: &mut R, ctx: &mut Context<R>) -> Flow {
        actor.on_message(&mut self.payload, ctx)
    }
}

/// Installs a channel into the directory slot for `M`
///
/// Travels on the high band so that an installation never loses deliveries
/// initiated after `connect` returned to the caller.
pub(crate) struct InstallParcel<M: 'static> {
    channel: Channel<M>,
}

impl<M: 'static> InstallParcel<M> {
    pub(crate) fn new(channel: Channel<M>) -> Self {
        Self { channel }
    }
}

impl<R, M> Parcel<R> for InstallParcel<M>
where
    R: Actor,
    M: 'static,
{
    fn deliver(&mut self, _actor: &mut R, ctx: &mut Context<R>) -> Flow {
        ctx.directory.install(self.channel.clone());
        Ok(())
    }
}
