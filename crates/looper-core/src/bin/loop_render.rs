//! Offline looper renderer
//!
//! Runs a WAV file through the stereo looper and writes the result as a
//! 32-bit float WAV. The input is captured into the loop buffer, then the
//! looper keeps playing for `--tail` seconds after the input ends.
//!
//! ```text
//! loop-render input.wav output.wav --buffer 4 --freeze-at 6 --read-rate 0.5
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use looper_core::config::{load_config, LooperConfig};
use looper_core::engine::{
    command_channel, CommandSender, Direction, LooperCommand, LooperPhase, Movement,
    StereoLooper,
};
use looper_core::{ChannelSelect, StereoBuffer, StereoSample};

#[derive(Parser)]
#[command(name = "loop-render", about = "Render a WAV file through the tape looper")]
struct Cli {
    /// Input WAV file (mono or stereo)
    input: PathBuf,

    /// Output WAV file
    output: PathBuf,

    /// YAML looper configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Loop buffer length in seconds
    #[arg(short, long, default_value_t = 4.0)]
    buffer: f32,

    /// Seconds of looper output after the input ends
    #[arg(short, long, default_value_t = 4.0)]
    tail: f32,

    /// Freeze the loop at this time (seconds)
    #[arg(long)]
    freeze_at: Option<f32>,

    /// Read rate for both channels once recording
    #[arg(long)]
    read_rate: Option<f32>,

    /// Loop start in seconds
    #[arg(long)]
    loop_start: Option<f32>,

    /// Loop length in seconds
    #[arg(long)]
    loop_length: Option<f32>,

    #[arg(long)]
    mix: Option<f32>,

    #[arg(long)]
    feedback: Option<f32>,

    #[arg(long, value_enum)]
    movement: Option<MovementArg>,

    /// Play the loop backwards
    #[arg(long)]
    reverse: bool,

    /// Frames per processing block
    #[arg(long, default_value_t = 256)]
    block_size: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum MovementArg {
    Normal,
    Pendulum,
    Drunk,
}

impl From<MovementArg> for Movement {
    fn from(arg: MovementArg) -> Self {
        match arg {
            MovementArg::Normal => Movement::Normal,
            MovementArg::Pendulum => Movement::Pendulum,
            MovementArg::Drunk => Movement::Drunk,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    if cli.block_size == 0 {
        bail!("block size must be at least 1");
    }

    let mut config: LooperConfig = match &cli.config {
        Some(path) => load_config(path),
        None => LooperConfig::default(),
    };

    let (input, sample_rate) = read_wav(&cli.input)?;
    if sample_rate != config.sample_rate {
        log::info!(
            "Using the input sample rate {}Hz instead of {}Hz",
            sample_rate,
            config.sample_rate
        );
        config.sample_rate = sample_rate;
    }
    // Capture starts right away, the input is the warm-up
    config.startup_seconds = 0.0;

    let capacity = seconds_to_frames(cli.buffer, sample_rate).max(1);
    let tail = seconds_to_frames(cli.tail, sample_rate);
    let freeze_frame = cli.freeze_at.map(|t| seconds_to_frames(t, sample_rate));

    let mut left = vec![0.0f32; capacity];
    let mut right = vec![0.0f32; capacity];
    let mut looper = StereoLooper::new(&mut left, &mut right, &config)
        .context("Failed to create looper")?;

    let (tx, mut rx) = command_channel();
    let mut sender = CommandSender::new(tx);

    if let Some(mix) = cli.mix {
        send(&mut sender, LooperCommand::SetMix(mix))?;
    }
    if let Some(feedback) = cli.feedback {
        send(&mut sender, LooperCommand::SetFeedback(feedback))?;
    }
    if let Some(movement) = cli.movement {
        send(
            &mut sender,
            LooperCommand::SetMovement {
                channel: ChannelSelect::Both,
                movement: movement.into(),
            },
        )?;
    }

    log::info!(
        "Rendering {:?}: {} frames in, {} frame loop buffer, {} frame tail",
        cli.input,
        input.len(),
        capacity,
        tail
    );

    let total = input.len() + tail;
    let mut output = StereoBuffer::silence(total);
    let mut block = vec![StereoSample::silence(); cli.block_size];
    let mut loop_targets_sent = false;
    let mut frozen = false;
    let mut frame = 0;

    while frame < total {
        let len = cli.block_size.min(total - frame);

        if !loop_targets_sent && looper.is_running() {
            send_loop_targets(&mut sender, &cli, sample_rate)?;
            loop_targets_sent = true;
        }
        if let Some(at) = freeze_frame {
            if !frozen && frame >= at {
                log::info!("Freezing at frame {}", frame);
                send(&mut sender, LooperCommand::SetFreeze(1.0))?;
                frozen = true;
            }
        }

        for (i, slot) in block[..len].iter_mut().enumerate() {
            *slot = input
                .as_slice()
                .get(frame + i)
                .copied()
                .unwrap_or_else(StereoSample::silence);
        }

        looper.process_commands(&mut rx);
        looper.process_block(&mut block[..len]);
        output.as_mut_slice()[frame..frame + len].copy_from_slice(&block[..len]);
        frame += len;
    }

    if looper.phase() != LooperPhase::Recording && looper.phase() != LooperPhase::Frozen {
        log::warn!(
            "Looper never started playing (ended in {:?}); input shorter than the buffer?",
            looper.phase()
        );
    }

    write_wav(&cli.output, &output, sample_rate)?;
    log::info!("Wrote {:?} (peak {:.3})", cli.output, output.peak());
    Ok(())
}

fn send_loop_targets(sender: &mut CommandSender, cli: &Cli, sample_rate: u32) -> Result<()> {
    let channel = ChannelSelect::Both;
    if let Some(start) = cli.loop_start {
        let samples = start * sample_rate as f32;
        send(sender, LooperCommand::SetLoopStart { channel, samples })?;
    }
    if let Some(length) = cli.loop_length {
        let samples = length * sample_rate as f32;
        send(sender, LooperCommand::SetLoopLength { channel, samples })?;
    }
    if let Some(rate) = cli.read_rate {
        send(sender, LooperCommand::SetReadRate { channel, rate })?;
    }
    if cli.reverse {
        send(
            sender,
            LooperCommand::SetDirection {
                channel,
                direction: Direction::Backward,
            },
        )?;
    }
    Ok(())
}

fn send(sender: &mut CommandSender, cmd: LooperCommand) -> Result<()> {
    if sender.send(cmd).is_err() {
        bail!("Command queue full, dropped {:?}", cmd);
    }
    Ok(())
}

fn seconds_to_frames(seconds: f32, sample_rate: u32) -> usize {
    (seconds.max(0.0) as f64 * sample_rate as f64).round() as usize
}

/// Load a WAV file as stereo frames
///
/// Mono files are duplicated onto both channels; extra channels are ignored.
fn read_wav(path: &Path) -> Result<(StereoBuffer, u32)> {
    let reader =
        hound::WavReader::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        bail!("{:?} has no channels", path);
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to decode {:?}", path))?,
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()
                .with_context(|| format!("Failed to decode {:?}", path))?
        }
    };

    let interleaved: Vec<f32> = samples
        .chunks_exact(channels)
        .flat_map(|frame| {
            let left = frame[0];
            let right = if channels > 1 { frame[1] } else { left };
            [left, right]
        })
        .collect();

    Ok((StereoBuffer::from_interleaved(&interleaved), spec.sample_rate))
}

fn write_wav(path: &Path, buffer: &StereoBuffer, sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {:?}", path))?;
    for &sample in buffer.as_interleaved() {
        writer.write_sample(sample)?;
    }
    writer
        .finalize()
        .with_context(|| format!("Failed to finalize {:?}", path))?;
    Ok(())
}
