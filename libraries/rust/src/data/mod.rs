pub mod client;
pub use client::Client;
pub use client::Interface;
pub use client::MockInterface;
