//! WS2812B pixel ring behind the [`LightPort`] trait.
//!
//! Stages one frame in RAM and pushes it through any `smart-leds` writer on
//! `commit()`.  On the board the writer is the ESP-IDF RMT driver
//! ([`open_rmt_ring`]); tests plug in a recording writer.

use log::warn;
use smart_leds::{RGB8, SmartLedsWrite, brightness, gamma};

use crate::app::ports::LightPort;
use crate::feedback::render::MAX_RING_LEN;

pub struct PixelRing<W> {
    writer: W,
    pixels: heapless::Vec<RGB8, MAX_RING_LEN>,
    brightness: u8,
    write_failed: bool,
}

impl<W> PixelRing<W>
where
    W: SmartLedsWrite<Color = RGB8>,
    W::Error: core::fmt::Debug,
{
    /// `len` is capped at [`MAX_RING_LEN`].
    pub fn new(writer: W, len: usize) -> Self {
        let mut pixels = heapless::Vec::new();
        pixels.resize(len.min(MAX_RING_LEN), RGB8::default()).ok();
        Self {
            writer,
            pixels,
            brightness: 255,
            write_failed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Global brightness (0–255) applied after gamma correction.
    pub fn set_brightness(&mut self, level: u8) {
        self.brightness = level;
    }

    pub fn pixels(&self) -> &[RGB8] {
        &self.pixels
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }
}

impl<W> LightPort for PixelRing<W>
where
    W: SmartLedsWrite<Color = RGB8>,
    W::Error: core::fmt::Debug,
{
    fn set(&mut self, position: usize, r: u8, g: u8, b: u8) {
        if let Some(px) = self.pixels.get_mut(position) {
            *px = RGB8::new(r, g, b);
        }
    }

    fn commit(&mut self) {
        let frame = self.pixels.iter().copied();
        match self.writer.write(brightness(gamma(frame), self.brightness)) {
            Ok(()) => self.write_failed = false,
            // Log once per failure streak, not once per frame.
            Err(e) if !self.write_failed => {
                warn!("PixelRing: write failed: {:?}", e);
                self.write_failed = true;
            }
            Err(_) => {}
        }
    }
}

/// The board's ring on RMT channel 0.
#[cfg(target_os = "espidf")]
pub fn open_rmt_ring(
    channel: impl esp_idf_hal::peripheral::Peripheral<P = impl esp_idf_hal::rmt::RmtChannel> + 'static,
    pin: impl esp_idf_hal::peripheral::Peripheral<P = impl esp_idf_hal::gpio::OutputPin> + 'static,
    len: usize,
) -> Result<PixelRing<ws2812_esp32_rmt_driver::Ws2812Esp32Rmt<'static>>, crate::error::Error> {
    let writer = ws2812_esp32_rmt_driver::Ws2812Esp32Rmt::new(channel, pin)
        .map_err(|_| crate::error::Error::Init("RMT driver for LED ring"))?;
    log::info!("PixelRing: {} pixels on RMT", len);
    Ok(PixelRing::new(writer, len))
}
