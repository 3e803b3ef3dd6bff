//! # TF Server
//!
//! Broadcasts transforms to any number of subscribers over a ZMQ `PUB` socket.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
    tf::TransformMessage,
};

use crate::params::TunerExecParams;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Something transforms can be delivered to.
pub trait TfSink: Send {
    /// Deliver one transform.
    fn send(&mut self, tf: &TransformMessage) -> Result<(), TfServerError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Transform server
pub struct TfServer {
    socket: MonitoredSocket,

    topic: String,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TfServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send transform: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the transform: {0}")]
    SerializationError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TfServer {
    /// Create a new instance of the TF Server.
    ///
    /// This function will not block until a subscriber connects.
    pub fn new(ctx: &zmq::Context, params: &TunerExecParams) -> Result<Self, TfServerError> {
        // A subscriber only ever wants the latest transform, so keep the queue short and never
        // block the publisher on a slow consumer.
        let socket_options = SocketOptions {
            bind: true,
            linger: 1,
            send_timeout: 10,
            send_hwm: 10,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::PUB, socket_options, &params.tf_endpoint)
            .map_err(TfServerError::SocketError)?;

        Ok(Self {
            socket,
            topic: params.tf_topic.clone(),
        })
    }
}

impl TfSink for TfServer {
    fn send(&mut self, tf: &TransformMessage) -> Result<(), TfServerError> {
        let packet = tf
            .encode(&self.topic)
            .map_err(TfServerError::SerializationError)?;

        self.socket
            .send(packet.as_str(), 0)
            .map_err(TfServerError::SendError)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pose::{FrameLink, Pose};
    use chrono::Utc;

    #[test]
    fn test_publish_to_subscriber() {
        let ctx = zmq::Context::new();
        let params = TunerExecParams {
            tf_endpoint: "inproc://tf_server_test".into(),
            ..Default::default()
        };
        let mut server = TfServer::new(&ctx, &params).unwrap();

        let sub = ctx.socket(zmq::SUB).unwrap();
        sub.set_rcvtimeo(100).unwrap();
        sub.set_subscribe(params.tf_topic.as_bytes()).unwrap();
        sub.connect(&params.tf_endpoint).unwrap();

        let frames = FrameLink {
            parent: "odom".into(),
            child: "imu".into(),
        };
        let pose = Pose {
            z: 0.5,
            ..Default::default()
        };

        // Subscriptions take a moment to propagate, keep publishing until one arrives
        let mut received = None;
        for _ in 0..50 {
            server.send(&pose.to_transform(&frames, Utc::now())).unwrap();
            if let Ok(msg) = sub.recv_msg(0) {
                received = Some(TransformMessage::decode(&params.tf_topic, &msg).unwrap());
                break;
            }
        }

        let tf = received.expect("no transform received");
        assert_eq!(tf.parent_frame, "odom");
        assert_eq!(tf.child_frame, "imu");
        assert_eq!(tf.translation, [0.0, 0.0, 0.5]);
    }
}
