//! Remote image fetching for `Block::Image`.
//!
//! All images of a document are fetched up front, concurrently, before any
//! XML is written. Every failure is non-fatal: the block falls back to a text
//! placeholder and the reason is logged.

use super::xml::strip_control_chars;
use crate::config::{ImagePolicy, RenderConfig};
use crate::error::ImageFetchError;
use crate::model::Block;
use crate::style;
use futures::stream::{self, StreamExt};
use image::{ImageFormat, ImageReader};
use quick_xml::escape::escape;
use reqwest::{redirect, Url};
use std::collections::HashMap;
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, info, warn};

const MAX_REDIRECTS: usize = 10;

/// An image that was downloaded and decoded successfully.
#[derive(Debug, Clone)]
pub(crate) struct FetchedImage {
    pub bytes: Vec<u8>,
    /// File extension of the part under `word/media/`.
    pub extension: &'static str,
    pub width_px: u32,
    pub height_px: u32,
}

impl FetchedImage {
    /// Drawing extent in EMU at `width_cm`, preserving the aspect ratio.
    pub fn extent_emu(&self, width_cm: f64) -> (u64, u64) {
        let cx = style::cm_to_emu(width_cm);
        let cy = if self.width_px == 0 {
            cx
        } else {
            (cx as f64 * f64::from(self.height_px) / f64::from(self.width_px)).round() as u64
        };
        (cx, cy)
    }
}

/// Fetch every image block, keyed by block index. Missing keys mean
/// "render the placeholder".
pub(crate) async fn fetch_images(
    blocks: &[Block],
    config: &RenderConfig,
) -> HashMap<usize, FetchedImage> {
    let jobs: Vec<(usize, &str)> = blocks
        .iter()
        .enumerate()
        .filter_map(|(index, block)| match block {
            Block::Image { url, .. } => Some((index, url.as_str())),
            _ => None,
        })
        .collect();

    if jobs.is_empty() {
        return HashMap::new();
    }

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(config.image_timeout_secs))
        .redirect(redirect_policy(config.image_policy.clone()))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!("Cannot build HTTP client, all images become placeholders: {}", e);
            return HashMap::new();
        }
    };

    let total = jobs.len();
    let client = &client;
    let results: Vec<(usize, Result<FetchedImage, ImageFetchError>)> = stream::iter(jobs)
        .map(|(index, url)| async move { (index, fetch_one(client, url, config).await) })
        .buffer_unordered(config.image_concurrency.max(1))
        .collect()
        .await;

    let mut fetched = HashMap::new();
    for (index, result) in results {
        match result {
            Ok(image) => {
                debug!(
                    "Image {} fetched: {}×{} px, {} bytes",
                    index,
                    image.width_px,
                    image.height_px,
                    image.bytes.len()
                );
                fetched.insert(index, image);
            }
            Err(e @ (ImageFetchError::NotAllowed { .. } | ImageFetchError::UnsupportedScheme { .. })) => {
                debug!("Image {} skipped: {}", index, e);
            }
            Err(e) => warn!("Image {} replaced by placeholder: {}", index, e),
        }
    }

    info!("Images: {}/{} embedded", fetched.len(), total);
    fetched
}

async fn fetch_one(
    client: &reqwest::Client,
    url: &str,
    config: &RenderConfig,
) -> Result<FetchedImage, ImageFetchError> {
    check_url(url, config)?;

    let secs = config.image_timeout_secs;
    let network_error = |e: reqwest::Error| {
        if e.is_timeout() {
            ImageFetchError::Timeout {
                url: url.to_string(),
                secs,
            }
        } else {
            ImageFetchError::Network {
                url: url.to_string(),
                detail: e.to_string(),
            }
        }
    };

    let mut response = client.get(url).send().await.map_err(network_error)?;

    if !response.status().is_success() {
        return Err(ImageFetchError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let limit = config.image_max_bytes;
    let too_large = || ImageFetchError::TooLarge {
        url: url.to_string(),
        limit,
    };
    if response
        .content_length()
        .is_some_and(|len| len > limit as u64)
    {
        return Err(too_large());
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(network_error)? {
        if bytes.len() + chunk.len() > limit {
            return Err(too_large());
        }
        bytes.extend_from_slice(&chunk);
    }

    decode_image(url, bytes)
}

/// Scheme and policy gate, applied before any request is made.
fn check_url(url: &str, config: &RenderConfig) -> Result<(), ImageFetchError> {
    let parsed = Url::parse(url).map_err(|_| ImageFetchError::UnsupportedScheme {
        url: url.to_string(),
    })?;
    if !is_http(&parsed) {
        return Err(ImageFetchError::UnsupportedScheme {
            url: url.to_string(),
        });
    }
    if !host_allowed(&parsed, &config.image_policy) {
        return Err(ImageFetchError::NotAllowed {
            url: url.to_string(),
        });
    }
    Ok(())
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

fn host_allowed(url: &Url, policy: &ImagePolicy) -> bool {
    policy.allows_host(url.host_str().unwrap_or_default())
}

/// Redirect targets pass the same gate as the original URL. A refused hop
/// stops the chain and its 3xx response surfaces as `HttpStatus`.
fn redirect_policy(policy: ImagePolicy) -> redirect::Policy {
    redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if is_http(attempt.url()) && host_allowed(attempt.url(), &policy) {
            attempt.follow()
        } else {
            debug!("Refusing image redirect to {}", attempt.url());
            attempt.stop()
        }
    })
}

/// Sniff the format and read the pixel size. Only formats Word can display
/// inline are accepted.
pub(crate) fn decode_image(url: &str, bytes: Vec<u8>) -> Result<FetchedImage, ImageFetchError> {
    let undecodable = |detail: String| ImageFetchError::Undecodable {
        url: url.to_string(),
        detail,
    };

    let format = image::guess_format(&bytes).map_err(|e| undecodable(e.to_string()))?;
    let extension = match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Gif => "gif",
        ImageFormat::Bmp => "bmp",
        other => return Err(undecodable(format!("unsupported format {other:?}"))),
    };

    let (width_px, height_px) = ImageReader::with_format(Cursor::new(&bytes), format)
        .into_dimensions()
        .map_err(|e| undecodable(e.to_string()))?;

    Ok(FetchedImage {
        width_px,
        height_px,
        extension,
        bytes,
    })
}

/// Inline `<w:drawing>` run for an embedded picture.
pub(crate) fn drawing_run_xml(rel_id: &str, id: usize, alt: &str, cx: u64, cy: u64) -> String {
    let alt = strip_control_chars(alt);
    let descr = escape(alt.as_str());
    format!(
        concat!(
            r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
            r#"<wp:docPr id="{id}" name="Picture {id}" descr="{descr}"/>"#,
            r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
            r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="{id}" name="Picture {id}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
            r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#,
        ),
        cx = cx,
        cy = cy,
        id = id,
        descr = descr,
        rel_id = rel_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn http_response(status: &str, headers: &[(&str, String)], body: &[u8]) -> Vec<u8> {
        let mut out = format!("HTTP/1.1 {status}\r\nConnection: close\r\n");
        for (name, value) in headers {
            out.push_str(&format!("{name}: {value}\r\n"));
        }
        out.push_str("\r\n");
        let mut out = out.into_bytes();
        out.extend_from_slice(body);
        out
    }

    /// Answer every connection with `response`; returns the address and a
    /// connection counter.
    async fn serve(response: Vec<u8>) -> (SocketAddr, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            }
        });
        (addr, hits)
    }

    fn png_response(width: u32, height: u32) -> Vec<u8> {
        let png = png_bytes(width, height);
        http_response(
            "200 OK",
            &[
                ("Content-Type", "image/png".into()),
                ("Content-Length", png.len().to_string()),
            ],
            &png,
        )
    }

    fn image_block(url: &str) -> Block {
        Block::Image {
            alt: String::new(),
            url: url.into(),
        }
    }

    #[test]
    fn decodes_png_dimensions() {
        let image = decode_image("x.png", png_bytes(40, 10)).unwrap();
        assert_eq!(image.extension, "png");
        assert_eq!((image.width_px, image.height_px), (40, 10));
        assert_eq!(image.extent_emu(14.0), (5_040_000, 1_260_000));
    }

    #[test]
    fn rejects_non_image_bytes() {
        let err = decode_image("x.png", b"<html>not found</html>".to_vec()).unwrap_err();
        assert!(matches!(err, ImageFetchError::Undecodable { .. }));
    }

    #[test]
    fn only_http_schemes_are_fetched() {
        let config = RenderConfig::default();
        for url in ["data:image/png;base64,AAAA", "file:///etc/passwd", "ftp://x.org/a.png", "not a url"] {
            assert!(
                matches!(check_url(url, &config), Err(ImageFetchError::UnsupportedScheme { .. })),
                "{url}"
            );
        }
        assert!(check_url("https://example.org/a.png", &config).is_ok());
    }

    #[test]
    fn policy_gates_hosts() {
        let config = RenderConfig::builder()
            .image_policy(ImagePolicy::AllowHosts(vec!["img.example.org".into()]))
            .build()
            .unwrap();
        assert!(check_url("https://img.example.org/a.png", &config).is_ok());
        assert!(matches!(
            check_url("https://other.example.org/a.png", &config),
            Err(ImageFetchError::NotAllowed { .. })
        ));
    }

    #[tokio::test]
    async fn disabled_policy_fetches_nothing() {
        let config = RenderConfig::builder()
            .image_policy(ImagePolicy::Disabled)
            .build()
            .unwrap();
        let blocks = vec![image_block("https://example.org/a.png")];
        assert!(fetch_images(&blocks, &config).await.is_empty());
    }

    #[tokio::test]
    async fn data_urls_become_placeholders() {
        let blocks = vec![image_block("data:image/png;base64,iVBORw0KGgo=")];
        assert!(fetch_images(&blocks, &RenderConfig::default()).await.is_empty());
    }

    #[test]
    fn drawing_escapes_alt_text() {
        let xml = drawing_run_xml("rIdImage1", 1, "a \"b\" <c>", 10, 20);
        assert!(xml.contains(r#"r:embed="rIdImage1""#));
        assert!(xml.contains(r#"<wp:extent cx="10" cy="20"/>"#));
        assert!(!xml.contains("<c>"));
    }

    #[test]
    fn drawing_drops_control_characters() {
        let xml = drawing_run_xml("rIdImage1", 1, "Схема\u{1}", 10, 20);
        assert!(xml.contains(r#"descr="Схема""#));
    }

    #[tokio::test]
    async fn served_png_is_embedded() {
        let (addr, hits) = serve(png_response(30, 15)).await;
        let blocks = vec![
            Block::Paragraph { runs: vec![] },
            image_block(&format!("http://{addr}/a.png")),
        ];
        let fetched = fetch_images(&blocks, &RenderConfig::default()).await;

        let image = fetched.get(&1).expect("image embedded");
        assert_eq!(image.extension, "png");
        assert_eq!((image.width_px, image.height_px), (30, 15));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn not_found_becomes_placeholder() {
        let response = http_response("404 Not Found", &[("Content-Length", "9".into())], b"not found");
        let (addr, _) = serve(response).await;
        let blocks = vec![image_block(&format!("http://{addr}/missing.png"))];
        assert!(fetch_images(&blocks, &RenderConfig::default()).await.is_empty());
    }

    #[tokio::test]
    async fn bodies_over_the_cap_become_placeholders() {
        let config = RenderConfig::builder().image_max_bytes(32).build().unwrap();
        let png = png_bytes(64, 64);
        assert!(png.len() > 32);

        let declared = http_response("200 OK", &[("Content-Length", png.len().to_string())], &png);
        let (declared_addr, _) = serve(declared).await;
        let blocks = vec![image_block(&format!("http://{declared_addr}/big.png"))];
        assert!(fetch_images(&blocks, &config).await.is_empty());

        // No length header: the cap is enforced while streaming.
        let streamed = http_response("200 OK", &[], &png);
        let (streamed_addr, _) = serve(streamed).await;
        let blocks = vec![image_block(&format!("http://{streamed_addr}/big.png"))];
        assert!(fetch_images(&blocks, &config).await.is_empty());
    }

    #[tokio::test]
    async fn redirect_to_a_host_off_the_allow_list_is_not_followed() {
        let (target, target_hits) = serve(png_response(8, 8)).await;
        let redirect = http_response(
            "302 Found",
            &[
                ("Location", format!("http://localhost:{}/secret.png", target.port())),
                ("Content-Length", "0".into()),
            ],
            b"",
        );
        let (origin, origin_hits) = serve(redirect).await;

        let config = RenderConfig::builder()
            .image_policy(ImagePolicy::AllowHosts(vec!["127.0.0.1".into()]))
            .build()
            .unwrap();
        let blocks = vec![image_block(&format!("http://{origin}/a.png"))];

        assert!(fetch_images(&blocks, &config).await.is_empty());
        assert_eq!(origin_hits.load(Ordering::SeqCst), 1);
        assert_eq!(target_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn redirect_within_the_allow_list_is_followed() {
        let (target, _) = serve(png_response(8, 4)).await;
        let redirect = http_response(
            "302 Found",
            &[
                ("Location", format!("http://{target}/moved.png")),
                ("Content-Length", "0".into()),
            ],
            b"",
        );
        let (origin, _) = serve(redirect).await;

        let config = RenderConfig::builder()
            .image_policy(ImagePolicy::AllowHosts(vec!["127.0.0.1".into()]))
            .build()
            .unwrap();
        let blocks = vec![image_block(&format!("http://{origin}/a.png"))];

        let fetched = fetch_images(&blocks, &config).await;
        assert_eq!(fetched.get(&0).map(|i| (i.width_px, i.height_px)), Some((8, 4)));
    }
}
