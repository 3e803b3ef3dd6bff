//! Subscribe to a transform broadcast and print every transform received

use comms_if::{
    net::{zmq, MonitoredSocket, SocketOptions},
    tf::TransformMessage,
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "tf_echo", about = "Print transforms published by the keyboard TF tuner")]
struct Opt {
    /// Endpoint the tuner publishes on
    #[structopt(short, long, default_value = "tcp://localhost:5010")]
    endpoint: String,

    /// Topic the transforms are published under
    #[structopt(short, long, default_value = "tf")]
    topic: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Opt::from_args();

    let ctx = zmq::Context::new();

    let socket = MonitoredSocket::new(&ctx, zmq::SUB, SocketOptions::default(), &opt.endpoint)?;

    // Only take the transform messages
    socket.set_subscribe(opt.topic.as_bytes())?;

    println!("Listening for \"{}\" on {}", opt.topic, opt.endpoint);

    loop {
        let msg = socket.recv_msg(0)?;

        match TransformMessage::decode(&opt.topic, &msg) {
            Ok(tf) => println!("[{}] {}\n", tf.stamp, tf),
            Err(e) => println!("Could not decode message: {}", e),
        }
    }
}
