extern crate ffmpeg_next as ffmpeg;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ffmpeg::codec::Context as CodecContext;
use ffmpeg::decoder::Video as DecoderVideo;
use ffmpeg::format::context::Input as FormatContext;
use ffmpeg::format::{input_with_dictionary, Pixel};
use ffmpeg::frame::Video as FrameVideo;
use ffmpeg::media::Type;
use ffmpeg::software::scaling::context::Context as ScalingContext;
use ffmpeg::util::log as ffmpeglog;
use ffmpeg::{Dictionary, Packet as CodecPacket, Rational, Rescale};
use ffmpeg_sys_next::{AV_NOPTS_VALUE, AV_TIME_BASE_Q};
use image::RgbImage;

use super::{FrameIndex, FrameSource, VideoMetadata};
use crate::error::{DecodeError, OpenError};

static FFMPEG_INITIALIZED: OnceLock<Result<(), ffmpeg::Error>> = OnceLock::new();

fn init_ffmpeg() -> Result<(), OpenError> {
    let init = FFMPEG_INITIALIZED.get_or_init(|| {
        ffmpeg::init()?;
        ffmpeglog::set_level(ffmpeglog::Level::Error);
        Ok(())
    });
    (*init).map_err(OpenError::Init)
}

/// A video file opened with ffmpeg. Owns its demuxer, decoder and pixel converter, so
/// one of these must never be shared between threads doing work at the same time.
pub struct VideoSource {
    path: PathBuf,
    metadata: VideoMetadata,

    ictx: FormatContext,
    decoder: DecoderVideo,
    converter: ScalingContext,

    video_stream_index: usize,
    timebase: Rational,
    first_timestamp: i64,
}

impl VideoSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OpenError> {
        init_ffmpeg()?;
        let path = path.as_ref().to_path_buf();

        let options = {
            let mut options = Dictionary::new();
            options.set("analyzeduration", "10M");
            options.set("probesize", "5M"); // this is the default
            options
        };
        let mut ictx =
            input_with_dictionary(&path, options).map_err(|source| {
                OpenError::Container {
                    path: path.clone(),
                    source,
                }
            })?;

        let video = ictx
            .streams()
            .best(Type::Video)
            .ok_or_else(|| OpenError::NoVideoStream { path: path.clone() })?;

        let video_stream_index = video.index();
        let timebase = video.time_base();
        let first_timestamp = match video.start_time() {
            AV_NOPTS_VALUE => 0,
            start => start,
        };
        let frame_rate = stream_frame_rate(&video);
        let frame_count = stream_frame_count(&video, ictx.duration(), frame_rate);

        let decoder_error = |source| OpenError::Decoder {
            path: path.clone(),
            source,
        };
        let decoder = CodecContext::from_parameters(video.parameters())
            .and_then(|ctx| ctx.decoder().video())
            .map_err(decoder_error)?;
        let converter = pixel_converter(&decoder).map_err(decoder_error)?;

        if frame_count == 0 {
            return Err(OpenError::NoFrames { path });
        }

        ictx.streams_mut()
            .filter(|stream| stream.index() != video_stream_index)
            .for_each(|mut stream| stream_set_discard_all(&mut stream));

        let metadata = VideoMetadata {
            frame_count,
            frame_rate,
            width: decoder.width(),
            height: decoder.height(),
        };
        log::debug!("Opened {}: {:?}", path.display(), metadata);

        Ok(Self {
            path,
            metadata,
            ictx,
            decoder,
            converter,
            video_stream_index,
            timebase,
            first_timestamp,
        })
    }

    fn decode_error(index: FrameIndex) -> impl Fn(ffmpeg::Error) -> DecodeError {
        move |source| DecodeError::Ffmpeg { index, source }
    }

    fn convert(&mut self, frame: &FrameVideo) -> Result<RgbImage, ffmpeg::Error> {
        let mut converted = FrameVideo::empty();
        self.converter.run(frame, &mut converted)?;
        Ok(create_rust_image(converted))
    }
}

impl FrameSource for VideoSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn seek_and_decode(&mut self, index: FrameIndex) -> Result<RgbImage, DecodeError> {
        let frame_count = self.metadata.frame_count;
        if index >= frame_count {
            return Err(DecodeError::OutOfRange { index, frame_count });
        }

        let target = index_to_timestamp(
            index,
            self.metadata.frame_rate,
            self.timebase,
            self.first_timestamp,
        );
        // Lands on the closest keyframe before the target, the frames in between are
        // decoded and thrown away below.
        seek_file(&mut self.ictx, self.video_stream_index, i64::MIN, target, target)
            .map_err(Self::decode_error(index))?;
        self.decoder.flush();

        loop {
            loop {
                let mut frame = FrameVideo::empty();
                // https://ffmpeg.org/doxygen/trunk/group__lavc__decoding.html#ga11e6542c4e66d3028668788a1a74217c
                match self.decoder.receive_frame(&mut frame) {
                    Ok(()) => (),
                    Err(ffmpeg::Error::Other {
                        errno: libc::EAGAIN,
                    }) => break,
                    Err(ffmpeg::Error::Eof) => {
                        return Err(DecodeError::EndOfStream { index })
                    }
                    Err(e) => return Err(Self::decode_error(index)(e)),
                }

                let Some(ts) = frame.timestamp() else {
                    log::warn!(
                        "A frame without a timestamp showed up while looking for frame \
                         {index} in {}",
                        self.path.display()
                    );
                    continue;
                };

                let decoded_index = timestamp_to_index(
                    ts,
                    self.metadata.frame_rate,
                    self.timebase,
                    self.first_timestamp,
                );
                if decoded_index < index as i64 {
                    continue;
                }

                return self.convert(&frame).map_err(Self::decode_error(index));
            }

            loop {
                // http://ffmpeg.org/doxygen/trunk/group__lavf__decoding.html#ga4fdb3084415a82e3810de6ee60e46a61
                let mut packet = CodecPacket::empty();
                match packet.read(&mut self.ictx) {
                    Ok(()) if packet.stream() == self.video_stream_index => {
                        match self.decoder.send_packet(&packet) {
                            Ok(()) => break,
                            Err(e) => {
                                log::warn!(
                                    "Failed to decode a packet of {}: {}",
                                    self.path.display(),
                                    e
                                );
                                continue;
                            }
                        }
                    }
                    Ok(()) => continue,
                    Err(ffmpeg::Error::Eof) => {
                        self.decoder
                            .send_eof()
                            .map_err(Self::decode_error(index))?;
                        break;
                    }
                    Err(e) => return Err(Self::decode_error(index)(e)),
                }
            }
        }
    }
}

fn stream_frame_rate(video: &ffmpeg::Stream) -> f64 {
    let usable = |rate: Rational| rate.numerator() > 0 && rate.denominator() > 0;
    [video.avg_frame_rate(), video.rate()]
        .into_iter()
        .find(|rate| usable(*rate))
        .map(f64::from)
        .unwrap_or(0.0)
}

/// Prefers the number of frames the container says it has, otherwise estimates it from
/// the duration of the stream, or of the whole container.
fn stream_frame_count(
    video: &ffmpeg::Stream,
    container_duration: i64,
    frame_rate: f64,
) -> FrameIndex {
    if let Ok(frames @ 1..) = FrameIndex::try_from(video.frames()) {
        return frames;
    }

    let timebase = video.time_base();
    let duration = match video.duration() {
        AV_NOPTS_VALUE if container_duration == AV_NOPTS_VALUE => return 0,
        AV_NOPTS_VALUE => container_duration.rescale(AV_TIME_BASE_Q, timebase),
        duration => duration,
    };

    let frames = (duration as f64 * f64::from(timebase) * frame_rate).round();
    if frames.is_finite() && frames >= 1.0 {
        frames as FrameIndex
    } else {
        0
    }
}

fn index_to_timestamp(
    index: FrameIndex,
    frame_rate: f64,
    timebase: Rational,
    first_timestamp: i64,
) -> i64 {
    let seconds = index as f64 / frame_rate;
    first_timestamp + (seconds / f64::from(timebase)).round() as i64
}

fn timestamp_to_index(
    ts: i64,
    frame_rate: f64,
    timebase: Rational,
    first_timestamp: i64,
) -> i64 {
    let seconds = (ts - first_timestamp) as f64 * f64::from(timebase);
    (seconds * frame_rate).round() as i64
}

fn pixel_converter(decoder: &DecoderVideo) -> Result<ScalingContext, ffmpeg::Error> {
    if decoder.format() == Pixel::None {
        return Err(ffmpeg::Error::InvalidData);
    }
    ScalingContext::get(
        decoder.format(),
        decoder.width(),
        decoder.height(),
        // http://git.videolan.org/?p=ffmpeg.git;a=blob;f=libavutil/pixfmt.h;hb=HEAD
        Pixel::RGB24,
        decoder.width(),
        decoder.height(),
        ffmpeg::software::scaling::Flags::FAST_BILINEAR,
    )
}

fn create_rust_image(converted: FrameVideo) -> RgbImage {
    assert_eq!(Pixel::RGB24, converted.format());
    assert_eq!(1, converted.planes());

    let src_linesize = converted.stride(0);
    let width: usize = converted.width().try_into().expect("will always fit");
    let height: usize = converted.height().try_into().expect("will always fit");
    let data = converted.data(0);
    let trg_linesize = 3 * width;

    // ffmpeg pads every row, the image crate wants them tightly packed
    let data = if src_linesize == trg_linesize {
        data[..trg_linesize * height].to_vec()
    } else {
        assert!(src_linesize >= trg_linesize);
        data.chunks(src_linesize)
            .take(height)
            .flat_map(|row| &row[..trg_linesize])
            .copied()
            .collect()
    };

    RgbImage::from_vec(converted.width(), converted.height(), data)
        .expect("the buffer is big enough!")
}

fn stream_set_discard_all(stream: &mut ffmpeg::StreamMut<'_>) {
    unsafe {
        let ptr = stream.as_mut_ptr();
        if !ptr.is_null() {
            (*ptr).discard = ffmpeg_sys_next::AVDiscard::AVDISCARD_ALL;
        }
    }
}

/// `avformat_seek_file` on a specific stream, `FormatContext::seek` always uses the
/// default stream.
fn seek_file(
    input: &mut FormatContext,
    stream_index: usize,
    min_ts: i64,
    ts: i64,
    max_ts: i64,
) -> Result<(), ffmpeg::Error> {
    let stream_index = stream_index
        .try_into()
        .expect("will probably not be that big");
    unsafe {
        match ffmpeg_sys_next::avformat_seek_file(
            input.as_mut_ptr(),
            stream_index,
            min_ts,
            ts,
            max_ts,
            0,
        ) {
            s if s >= 0 => Ok(()),
            e => Err(ffmpeg::Error::from(e)),
        }
    }
}

impl fmt::Debug for VideoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            path,
            metadata,
            timebase,
            first_timestamp,
            ..
        } = self;

        f.debug_struct("VideoSource")
            .field("path", path)
            .field("metadata", metadata)
            .field(
                "tb",
                &format_args!("{}/{}", timebase.numerator(), timebase.denominator()),
            )
            .field("first_ts", first_timestamp)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn index_timestamp_conversions() {
        let ms = Rational::new(1, 1000);
        assert_eq!(1000, index_to_timestamp(30, 30.0, ms, 0));
        assert_eq!(1033, index_to_timestamp(31, 30.0, ms, 0));
        assert_eq!(1033 + 7, index_to_timestamp(31, 30.0, ms, 7));

        assert_eq!(30, timestamp_to_index(1000, 30.0, ms, 0));
        assert_eq!(31, timestamp_to_index(1033, 30.0, ms, 0));
        assert_eq!(31, timestamp_to_index(1040, 30.0, ms, 7));
    }

    #[test]
    fn conversions_round_trip_on_odd_timebases() {
        let tb = Rational::new(1, 90000);
        let fps = 30000.0 / 1001.0;
        for index in [0, 1, 29, 30, 1799, 123_456] {
            let ts = index_to_timestamp(index, fps, tb, 1234);
            assert_eq!(index as i64, timestamp_to_index(ts, fps, tb, 1234));
        }
    }
}
