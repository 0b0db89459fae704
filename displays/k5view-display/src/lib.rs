//! Rendering for the K5 screen mirror
//!
//! This crate turns a 1024-byte framebuffer snapshot into something a
//! display can show:
//! - [`render`] - pure bit-to-pixel expansion into a [`PixelGrid`]
//! - [`graphics`] - embedded-graphics drawables, 1:1 or scaled
//! - [`page`] - conversion to and from ST7565/SH1106 page memory
//!
//! All functions work on snapshots and never touch the live store, so they
//! can run concurrently with decoding.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod graphics;
pub mod page;
pub mod render;

pub use graphics::{FramebufferImage, Palette, PixelScale, ScaledImage};
pub use page::{from_pages, to_pages, PageBuffer, PAGES};
pub use render::{bit_at, render, PixelGrid};
