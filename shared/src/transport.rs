use crate::{ConnectionRef, HostBoundMessage, HostType, OwnerBoundMessage, Routed, TransportError};

/// Used by a client process to reach the host.
pub trait HostSender {
    fn send(&mut self, message: HostBoundMessage) -> Result<(), TransportError>;
}

/// Used by the host to reach one connected participant.
pub trait OwnerSender {
    fn send(
        &mut self,
        connection: &ConnectionRef,
        message: OwnerBoundMessage,
    ) -> Result<(), TransportError>;
}

/// Checks that `sender` may put `message` on its channel, and that the
/// channel leads to `receiver`.
pub fn check_route(
    message: &impl Routed,
    sender: HostType,
    receiver: HostType,
) -> Result<(), TransportError> {
    if !message.flags().allows_sender(sender) {
        return Err(TransportError::SenderNotAllowed {
            sender: sender.name(),
            message: message.name(),
        });
    }
    let expected = message.direction().receiver();
    if expected != receiver {
        return Err(TransportError::WrongDirection {
            message: message.name(),
            expected: expected.name(),
            receiver: receiver.name(),
        });
    }
    Ok(())
}
