use std::{future::Future, time::Duration};

use async_trait::async_trait;
use tokio_modbus::{
    client::{Context, Reader, Writer},
    slave::{Slave, SlaveContext},
};

use crate::codec::{Address, Quantity, Word};
use crate::config::TransportConfig;
use crate::core::Transport;

#[async_trait]
impl Transport for Context {
    fn set_slave(&mut self, slave: Slave) {
        SlaveContext::set_slave(self, slave)
    }

    async fn read_holding_registers(
        &mut self,
        addr: Address,
        cnt: Quantity,
    ) -> tokio_modbus::Result<Vec<Word>> {
        Reader::read_holding_registers(self, addr, cnt).await
    }

    async fn read_input_registers(
        &mut self,
        addr: Address,
        cnt: Quantity,
    ) -> tokio_modbus::Result<Vec<Word>> {
        Reader::read_input_registers(self, addr, cnt).await
    }

    async fn write_single_register(
        &mut self,
        addr: Address,
        word: Word,
    ) -> tokio_modbus::Result<()> {
        Writer::write_single_register(self, addr, word).await
    }
}

/// Bounds every exchange of the wrapped transport.
///
/// An expired exchange is reported as `tokio_modbus::Error::Transport` with
/// [`std::io::ErrorKind::TimedOut`].
#[derive(Debug)]
pub struct Timeout<T> {
    inner: T,
    duration: Duration,
}

impl<T> Timeout<T> {
    pub fn new(inner: T, duration: Duration) -> Self {
        Self { inner, duration }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

async fn bounded<R>(
    duration: Duration,
    exchange: impl Future<Output = tokio_modbus::Result<R>>,
) -> tokio_modbus::Result<R> {
    match tokio::time::timeout(duration, exchange).await {
        Ok(result) => result,
        Err(_) => Err(tokio_modbus::Error::Transport(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            format!("no response within {duration:?}"),
        ))),
    }
}

#[async_trait]
impl<T: Transport> Transport for Timeout<T> {
    fn set_slave(&mut self, slave: Slave) {
        self.inner.set_slave(slave)
    }

    async fn read_holding_registers(
        &mut self,
        addr: Address,
        cnt: Quantity,
    ) -> tokio_modbus::Result<Vec<Word>> {
        bounded(self.duration, self.inner.read_holding_registers(addr, cnt)).await
    }

    async fn read_input_registers(
        &mut self,
        addr: Address,
        cnt: Quantity,
    ) -> tokio_modbus::Result<Vec<Word>> {
        bounded(self.duration, self.inner.read_input_registers(addr, cnt)).await
    }

    async fn write_single_register(
        &mut self,
        addr: Address,
        word: Word,
    ) -> tokio_modbus::Result<()> {
        bounded(self.duration, self.inner.write_single_register(addr, word)).await
    }
}

#[cfg(feature = "serial")]
fn serial_builder(
    serial: &crate::config::SerialConfig,
) -> std::io::Result<tokio_serial::SerialPortBuilder> {
    use crate::config::Parity;
    use tokio_serial::{DataBits, StopBits};

    let invalid = |what: String| std::io::Error::new(std::io::ErrorKind::InvalidInput, what);
    let data_bits = match serial.data_bits {
        5 => DataBits::Five,
        6 => DataBits::Six,
        7 => DataBits::Seven,
        8 => DataBits::Eight,
        other => return Err(invalid(format!("unsupported data bits {other}"))),
    };
    let stop_bits = match serial.stop_bits {
        1 => StopBits::One,
        2 => StopBits::Two,
        other => return Err(invalid(format!("unsupported stop bits {other}"))),
    };
    let parity = match serial.parity {
        Parity::None => tokio_serial::Parity::None,
        Parity::Odd => tokio_serial::Parity::Odd,
        Parity::Even => tokio_serial::Parity::Even,
    };
    Ok(tokio_serial::new(&serial.port, serial.baud_rate)
        .data_bits(data_bits)
        .stop_bits(stop_bits)
        .parity(parity))
}

/// Open the configured bus as an RTU master, every exchange bounded by the configured timeout.
///
/// The slave is set per operation, the context starts out addressing the broadcast id.
pub async fn open(config: &TransportConfig) -> std::io::Result<Timeout<Context>> {
    let context = match config {
        #[cfg(feature = "serial")]
        TransportConfig::Rtu(serial) => {
            let builder = serial_builder(serial)?;
            let stream = tokio_serial::SerialStream::open(&builder)?;
            tokio_modbus::client::rtu::attach(stream)
        }
        #[cfg(not(feature = "serial"))]
        TransportConfig::Rtu(_) => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "built without the `serial` feature",
            ))
        }
        TransportConfig::Tcp(gateway) => {
            let stream = tokio::net::TcpStream::connect(gateway.address).await?;
            tokio_modbus::client::rtu::attach(stream)
        }
    };
    Ok(Timeout::new(context, config.timeout()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;
    use crate::drive::read_telemetry;
    use crate::error::TransportError;

    /// Accepts requests and never answers.
    struct Silent;

    #[async_trait]
    impl Transport for Silent {
        fn set_slave(&mut self, _slave: Slave) {}

        async fn read_holding_registers(
            &mut self,
            _addr: Address,
            _cnt: Quantity,
        ) -> tokio_modbus::Result<Vec<Word>> {
            std::future::pending().await
        }

        async fn read_input_registers(
            &mut self,
            _addr: Address,
            _cnt: Quantity,
        ) -> tokio_modbus::Result<Vec<Word>> {
            std::future::pending().await
        }

        async fn write_single_register(
            &mut self,
            _addr: Address,
            _word: Word,
        ) -> tokio_modbus::Result<()> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_transport_error() {
        let mut transport = Timeout::new(Silent, Duration::from_millis(500));

        let result = transport.write_single_register(0, 1).await;
        match result {
            Err(tokio_modbus::Error::Transport(err)) => {
                assert_eq!(err.kind(), std::io::ErrorKind::TimedOut)
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_drive_fails_telemetry_after_fallback() {
        let mut transport = Timeout::new(Silent, Duration::from_millis(500));

        let err = read_telemetry(&mut transport, &DeviceConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Modbus(_)));
    }
}
