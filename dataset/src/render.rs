//! External renderer invocation and scene file lifecycle.

use std::{
    ffi::OsString,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    process::Command,
};

use tempfile::{Builder, NamedTempFile};
use tracing::{debug, warn};

use crate::{
    error::{DatasetError, DatasetResult},
    lighting::LightingRig,
    pose::PieceInstance,
    scene::{SceneWriter, compose_scene},
};

pub const IMAGE_WIDTH: u32 = 256;
pub const IMAGE_HEIGHT: u32 = 256;

/// One renderer invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderJob<'a> {
    pub scene: &'a Path,
    pub image: &'a Path,
    pub width: u32,
    pub height: u32,
}

pub trait Renderer {
    /// Renders `job.scene` into `job.image`, blocking until done.
    fn render(&self, job: &RenderJob<'_>) -> DatasetResult<()>;
}

impl<R: Renderer + ?Sized> Renderer for &R {
    fn render(&self, job: &RenderJob<'_>) -> DatasetResult<()> {
        (**self).render(job)
    }
}

/// POV-Ray run as a subprocess.
#[derive(Clone, Debug)]
pub struct PovRay {
    pub program: OsString,
    /// Extra include directory, passed as `+L<path>` when set.
    pub library_path: Option<PathBuf>,
}

impl Default for PovRay {
    fn default() -> Self {
        Self {
            program: "povray".into(),
            library_path: None,
        }
    }
}

impl PovRay {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            library_path: None,
        }
    }

    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    /// `-i<scene> +W<w> +H<h> +FN -o<image>`, with `+L<path>` appended when a
    /// library path is configured.
    pub fn args(&self, job: &RenderJob<'_>) -> Vec<OsString> {
        let mut args = vec![
            prefixed("-i", job.scene),
            format!("+W{}", job.width).into(),
            format!("+H{}", job.height).into(),
            "+FN".into(),
            prefixed("-o", job.image),
        ];
        if let Some(lib) = &self.library_path {
            args.push(prefixed("+L", lib));
        }
        args
    }
}

fn prefixed(flag: &str, path: &Path) -> OsString {
    let mut s = OsString::from(flag);
    s.push(path.as_os_str());
    s
}

impl Renderer for PovRay {
    fn render(&self, job: &RenderJob<'_>) -> DatasetResult<()> {
        let output = Command::new(&self.program)
            .args(self.args(job))
            .output()
            .map_err(|source| DatasetError::RendererSpawn {
                program: self.program.to_string_lossy().into_owned(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }
        let mut diag = String::from_utf8_lossy(&output.stderr).into_owned();
        diag.push_str(&String::from_utf8_lossy(&output.stdout));
        Err(DatasetError::RenderFailure {
            image: job.image.to_path_buf(),
            code: output.status.code(),
            output: diag.trim().to_string(),
        })
    }
}

/// What happens to a scene file once its image has rendered.
/// Scenes of failed renders are always kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SceneRetention {
    #[default]
    Delete,
    Keep,
}

/// Writes one temporary scene per image and hands it to the renderer.
pub struct RenderInvoker<R, S> {
    renderer: R,
    writer: S,
    scratch_dir: PathBuf,
    retention: SceneRetention,
    width: u32,
    height: u32,
    verify_images: bool,
}

impl<R: Renderer, S: SceneWriter> RenderInvoker<R, S> {
    pub fn new(renderer: R, writer: S) -> Self {
        Self {
            renderer,
            writer,
            scratch_dir: std::env::temp_dir(),
            retention: SceneRetention::Delete,
            width: IMAGE_WIDTH,
            height: IMAGE_HEIGHT,
            verify_images: false,
        }
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn retention(mut self, retention: SceneRetention) -> Self {
        self.retention = retention;
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn verify_images(mut self, on: bool) -> Self {
        self.verify_images = on;
        self
    }

    /// Composes the scene for `piece` under `rig` and renders it to `image`.
    /// Returns the path of the retained scene file, if any.
    pub fn render_piece(
        &self,
        piece: &PieceInstance,
        rig: &LightingRig,
        image: &Path,
    ) -> DatasetResult<Option<PathBuf>> {
        let scene = self.compose(piece, rig)?;
        self.invoke(scene, image)
    }

    /// Writes the scene for `piece` under `rig` to a fresh file in the
    /// scratch directory. The file is removed if writing fails.
    pub fn compose(&self, piece: &PieceInstance, rig: &LightingRig) -> DatasetResult<NamedTempFile> {
        let scene = Builder::new()
            .prefix("scene")
            .suffix(".pov")
            .tempfile_in(&self.scratch_dir)
            .map_err(DatasetError::sink(&self.scratch_dir))?;

        {
            let mut out = BufWriter::new(scene.as_file());
            compose_scene(&self.writer, piece, rig, &mut out)
                .and_then(|()| out.flush())
                .map_err(DatasetError::sink(scene.path()))?;
        }
        Ok(scene)
    }

    /// Renders a composed scene to `image` and applies the retention policy.
    pub fn invoke(&self, scene: NamedTempFile, image: &Path) -> DatasetResult<Option<PathBuf>> {
        let scene_path = scene.path().to_path_buf();
        let job = RenderJob {
            scene: &scene_path,
            image,
            width: self.width,
            height: self.height,
        };
        let result = self.renderer.render(&job).and_then(|()| {
            if self.verify_images {
                check_image(image, self.width, self.height)
            } else {
                Ok(())
            }
        });

        match result {
            Ok(()) if self.retention == SceneRetention::Delete => {
                scene.close().map_err(DatasetError::sink(&scene_path))?;
                Ok(None)
            }
            Ok(()) => {
                let (_, path) = scene.keep().map_err(|e| DatasetError::sink(&scene_path)(e.error))?;
                debug!(scene = %path.display(), "kept scene file");
                Ok(Some(path))
            }
            Err(err) => {
                if let Ok((_, path)) = scene.keep() {
                    warn!(scene = %path.display(), "scene file retained after failed render");
                }
                Err(err)
            }
        }
    }
}

fn check_image(path: &Path, width: u32, height: u32) -> DatasetResult<()> {
    let failure = |output: String| DatasetError::RenderFailure {
        image: path.to_path_buf(),
        code: None,
        output,
    };
    let (w, h) = image::image_dimensions(path).map_err(|e| failure(format!("unreadable output image: {e}")))?;
    if (w, h) != (width, height) {
        return Err(failure(format!("expected {width}x{height} image, got {w}x{h}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use tempfile::TempDir;

    use super::*;
    use crate::{
        catalog::{BrickShape, Color},
        lighting::RIGS,
        pose::Rotation,
        scene::BrickCsgWriter,
    };

    #[derive(Default)]
    struct Recorder {
        scenes: RefCell<Vec<String>>,
        fail: bool,
    }

    impl Renderer for Recorder {
        fn render(&self, job: &RenderJob<'_>) -> DatasetResult<()> {
            self.scenes.borrow_mut().push(std::fs::read_to_string(job.scene).unwrap());
            if self.fail {
                return Err(DatasetError::RenderFailure {
                    image: job.image.to_path_buf(),
                    code: Some(1),
                    output: "boom".into(),
                });
            }
            image::RgbImage::new(job.width, job.height).save(job.image).unwrap();
            Ok(())
        }
    }

    fn piece() -> PieceInstance {
        PieceInstance::new(BrickShape::new("3003", "Brick2X2"), Color::first(1)[0], Rotation::new(10, 20, 30))
    }

    fn pov_files(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|x| x == "pov"))
            .count()
    }

    #[test]
    fn test_povray_args() {
        let pov = PovRay::default();
        let job = RenderJob {
            scene: Path::new("/tmp/scene1.pov"),
            image: Path::new("out/image00000.png"),
            width: 256,
            height: 128,
        };
        let args: Vec<String> = pov.args(&job).into_iter().map(|a| a.into_string().unwrap()).collect();
        assert_eq!(args, ["-i/tmp/scene1.pov", "+W256", "+H128", "+FN", "-oout/image00000.png"]);

        let with_lib = PovRay::default().with_library_path("/usr/share/lgeo");
        let last = with_lib.args(&job).pop().unwrap();
        assert_eq!(last, OsString::from("+L/usr/share/lgeo"));
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let pov = PovRay::new("definitely-not-a-renderer-binary");
        let job = RenderJob {
            scene: Path::new("a.pov"),
            image: Path::new("a.png"),
            width: 1,
            height: 1,
        };
        assert!(matches!(pov.render(&job), Err(DatasetError::RendererSpawn { .. })));
    }

    #[test]
    fn test_scene_deleted_after_success() {
        let scratch = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let recorder = Recorder::default();
        let invoker = RenderInvoker::new(&recorder, BrickCsgWriter).scratch_dir(scratch.path());

        let image = out.path().join("image00000.png");
        let kept = invoker.render_piece(&piece(), &RIGS[3], &image).unwrap();
        assert!(kept.is_none());
        assert!(image.exists());
        assert_eq!(pov_files(scratch.path()), 0);

        let scenes = recorder.scenes.borrow();
        assert_eq!(scenes.len(), 1);
        assert!(scenes[0].contains("3003.dat"));
        assert!(scenes[0].contains("camera {"));
    }

    #[test]
    fn test_scene_kept_on_request() {
        let scratch = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let recorder = Recorder::default();
        let invoker = RenderInvoker::new(&recorder, BrickCsgWriter)
            .scratch_dir(scratch.path())
            .retention(SceneRetention::Keep);

        let kept = invoker
            .render_piece(&piece(), &RIGS[0], &out.path().join("a.png"))
            .unwrap()
            .unwrap();
        assert!(kept.exists());
        assert_eq!(pov_files(scratch.path()), 1);
    }

    #[test]
    fn test_scene_kept_after_failure() {
        let scratch = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let recorder = Recorder { fail: true, ..Default::default() };
        let invoker = RenderInvoker::new(&recorder, BrickCsgWriter).scratch_dir(scratch.path());

        let err = invoker
            .render_piece(&piece(), &RIGS[0], &out.path().join("a.png"))
            .unwrap_err();
        assert!(matches!(err, DatasetError::RenderFailure { code: Some(1), .. }));
        assert_eq!(pov_files(scratch.path()), 1);
    }

    #[test]
    fn test_verify_rejects_wrong_size() {
        let scratch = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let recorder = Recorder::default();
        let invoker = RenderInvoker::new(&recorder, BrickCsgWriter)
            .scratch_dir(scratch.path())
            .size(16, 16)
            .verify_images(true);
        let image = out.path().join("ok.png");
        invoker.render_piece(&piece(), &RIGS[0], &image).unwrap();

        let err = check_image(&image, 32, 16).unwrap_err();
        match err {
            DatasetError::RenderFailure { code: None, output, .. } => {
                assert!(output.contains("expected 32x16"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_verify_rejects_missing_output() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            check_image(&dir.path().join("nothing.png"), 8, 8),
            Err(DatasetError::RenderFailure { code: None, .. })
        ));
    }
}
