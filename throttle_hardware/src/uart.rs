use std::path::Path;
use std::time::Duration;

use rppal::uart::{Parity, Uart};
use throttle_traits::CommandSource;
use tracing::trace;

use crate::error::{HwError, Result};

/// Command bytes arriving on a UART, one update per byte.
pub struct UartSource {
    uart: Uart,
    timeout: Duration,
}

impl UartSource {
    /// Open `device` at `baud`, 8N1.
    pub fn open(device: impl AsRef<Path>, baud: u32, timeout: Duration) -> Result<Self> {
        let mut uart = Uart::with_path(device, baud, Parity::None, 8, 1)
            .map_err(|e| HwError::Uart(format!("open uart: {e}")))?;
        uart.set_read_mode(1, timeout)
            .map_err(|e| HwError::Uart(format!("set read mode: {e}")))?;
        Ok(Self { uart, timeout })
    }

    pub fn read_byte(&mut self, timeout: Duration) -> Result<u8> {
        if timeout != self.timeout {
            self.uart
                .set_read_mode(1, timeout)
                .map_err(|e| HwError::Uart(format!("set read mode: {e}")))?;
            self.timeout = timeout;
        }
        let mut buf = [0u8; 1];
        let n = self
            .uart
            .read(&mut buf)
            .map_err(|e| HwError::Uart(e.to_string()))?;
        if n == 0 {
            return Err(HwError::Timeout);
        }
        trace!(byte = buf[0], "uart command byte");
        Ok(buf[0])
    }
}

impl CommandSource for UartSource {
    fn read(
        &mut self,
        timeout: Duration,
    ) -> std::result::Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        self.read_byte(timeout).map_err(Into::into)
    }
}
