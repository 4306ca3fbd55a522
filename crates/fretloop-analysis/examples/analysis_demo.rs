//! Analysis demo: FFT spectrum and window function comparison.
//!
//! Run with: cargo run -p fretloop-analysis --example analysis_demo

use fretloop_analysis::{Fft, Window, magnitude_spectrum, spectral_centroid};
use std::f32::consts::PI;

fn main() {
    let sample_rate = 48000.0;

    // --- Generate a test sine wave ---
    println!("=== FFT Spectrum of a 1 kHz Sine Wave ===\n");

    let freq = 1000.0;
    let duration_samples = 4096;
    let signal: Vec<f32> = (0..duration_samples)
        .map(|i| (2.0 * PI * freq * i as f32 / sample_rate).sin())
        .collect();

    // Compute FFT
    let fft_size = 4096;
    let fft = Fft::new(fft_size);

    let mut windowed = signal.clone();
    Window::Hann.apply(&mut windowed);
    let spectrum = fft.forward(&windowed);

    // Find peak bin
    let magnitudes: Vec<f32> = spectrum.iter().map(|c| c.norm()).collect();
    let peak_bin = magnitudes
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
        .map(|(i, _)| i)
        .unwrap();
    let peak_freq = peak_bin as f32 * sample_rate / fft_size as f32;

    println!("Input: {} Hz sine wave, {} samples", freq, duration_samples);
    println!("FFT size: {}, Window: Hann", fft_size);
    println!("Peak bin: {} (frequency: {:.1} Hz)", peak_bin, peak_freq);
    println!("Peak magnitude: {:.2}", magnitudes[peak_bin]);

    // Show spectrum around the peak
    println!("\nSpectrum around peak:");
    println!("{:>8} {:>10} {:>10}", "Bin", "Freq (Hz)", "Magnitude");
    println!("{:->8} {:->10} {:->10}", "", "", "");

    let start = peak_bin.saturating_sub(5);
    let end = (peak_bin + 6).min(magnitudes.len());
    for i in start..end {
        let f = i as f32 * sample_rate / fft_size as f32;
        let marker = if i == peak_bin { " <--" } else { "" };
        println!("{:>8} {:>10.1} {:>10.2}{}", i, f, magnitudes[i], marker);
    }

    // --- Magnitude spectrum convenience function ---
    println!("\n=== Magnitude Spectrum (convenience function) ===\n");

    let mag = magnitude_spectrum(&signal, fft_size, Window::Hann);
    let centroid = spectral_centroid(&mag, sample_rate);
    println!(
        "Spectral centroid: {:.1} Hz (expected ~{} Hz for pure sine)",
        centroid, freq
    );

    // --- Multi-tone signal ---
    println!("\n=== Multi-tone Signal (440 + 880 + 1320 Hz) ===\n");

    let multi_signal: Vec<f32> = (0..fft_size)
        .map(|i| {
            let t = i as f32 / sample_rate;
            0.5 * (2.0 * PI * 440.0 * t).sin()
                + 0.3 * (2.0 * PI * 880.0 * t).sin()
                + 0.2 * (2.0 * PI * 1320.0 * t).sin()
        })
        .collect();

    let multi_mag = magnitude_spectrum(&multi_signal, fft_size, Window::Hann);

    // Find top 5 peaks
    let mut indexed: Vec<(usize, f32)> = multi_mag.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

    println!("Top 5 spectral peaks:");
    println!("{:>8} {:>10} {:>10}", "Bin", "Freq (Hz)", "Magnitude");
    println!("{:->8} {:->10} {:->10}", "", "", "");

    for &(bin, mag) in indexed.iter().take(5) {
        let f = bin as f32 * sample_rate / fft_size as f32;
        println!("{:>8} {:>10.1} {:>10.4}", bin, f, mag);
    }

    // --- Window functions comparison ---
    println!("\n=== Window Functions ===\n");

    let windows = [
        ("Rectangular", Window::Rectangular),
        ("Hann", Window::Hann),
        ("Hamming", Window::Hamming),
        ("Blackman", Window::Blackman),
        ("Blackman-Harris", Window::BlackmanHarris),
    ];

    println!(
        "{:<18} {:>10} {:>10} {:>12}",
        "Window", "Peak Mag", "Peak Freq", "Centroid"
    );
    println!("{:-<18} {:->10} {:->10} {:->12}", "", "", "", "");

    for (name, window) in &windows {
        let mag = magnitude_spectrum(&signal, fft_size, *window);
        let peak_bin = mag
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        let peak_f = peak_bin as f32 * sample_rate / fft_size as f32;
        let cent = spectral_centroid(&mag, sample_rate);

        println!(
            "{:<18} {:>10.2} {:>10.1} {:>12.1}",
            name, mag[peak_bin], peak_f, cent
        );
    }

    println!("\nAnalysis demo complete.");
}
