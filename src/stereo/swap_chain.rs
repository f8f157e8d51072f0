use lib_hmd::{
    EYE_COUNT, HmdError, HmdSession, Recti, Sizei, SwapChainDesc, SwapChainFormat, SwapChainId,
    TextureSwapChain,
};
use tracing::debug;

/// The color and depth swap chains both eyes render into, side by side.
///
/// Each eye gets a half of equal size, large enough for the bigger of the two
/// requested eye sizes. Dropping this releases both chains in the runtime.
#[derive(Debug)]
pub struct StereoSwapChains {
    color: Box<dyn TextureSwapChain>,
    depth: Box<dyn TextureSwapChain>,
    eye_size: Sizei,
}

/// The swap chain images to render the current frame into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StereoImage {
    pub color_index: usize,
    pub depth_index: usize,
    pub size: Sizei,
}

impl StereoSwapChains {
    pub fn new<S: HmdSession + ?Sized>(
        session: &mut S,
        eye_sizes: [Sizei; EYE_COUNT],
    ) -> Result<Self, HmdError> {
        let eye_size = Sizei {
            w: eye_sizes[0].w.max(eye_sizes[1].w),
            h: eye_sizes[0].h.max(eye_sizes[1].h),
        };

        let desc = |format| SwapChainDesc {
            format,
            width: eye_size.w * EYE_COUNT as u32,
            height: eye_size.h,
            sample_count: 1,
        };

        // The color chain is released by its own drop if the depth one fails.
        let color = session.create_swap_chain(&desc(SwapChainFormat::Rgba8UnormSrgb))?;
        let depth = session.create_swap_chain(&desc(SwapChainFormat::Depth32Float))?;

        debug!(
            color = color.id().0,
            depth = depth.id().0,
            width = eye_size.w * EYE_COUNT as u32,
            height = eye_size.h,
            "stereo swap chains created"
        );

        Ok(Self {
            color,
            depth,
            eye_size,
        })
    }

    pub fn eye_size(&self) -> Sizei {
        self.eye_size
    }

    pub fn target_size(&self) -> Sizei {
        Sizei {
            w: self.eye_size.w * EYE_COUNT as u32,
            h: self.eye_size.h,
        }
    }

    /// Left half for the left eye, right half for the right eye.
    pub fn viewports(&self) -> [Recti; EYE_COUNT] {
        let Sizei { w, h } = self.eye_size;

        [Recti::new(0, 0, w, h), Recti::new(w as i32, 0, w, h)]
    }

    /// First pixel column of the right eye.
    pub fn split_x(&self) -> u32 {
        self.eye_size.w
    }

    pub fn color_id(&self) -> SwapChainId {
        self.color.id()
    }

    pub fn depth_id(&self) -> SwapChainId {
        self.depth.id()
    }

    pub fn color_desc(&self) -> &SwapChainDesc {
        self.color.desc()
    }

    pub fn depth_desc(&self) -> &SwapChainDesc {
        self.depth.desc()
    }

    /// Buffers in the color ring.
    pub fn color_len(&self) -> usize {
        self.color.len()
    }

    /// Buffers in the depth ring.
    pub fn depth_len(&self) -> usize {
        self.depth.len()
    }

    pub fn image(&self) -> StereoImage {
        StereoImage {
            color_index: self.color.current_index(),
            depth_index: self.depth.current_index(),
            size: self.target_size(),
        }
    }

    /// Hands the rendered images to the runtime.
    pub fn commit(&mut self) -> Result<(), HmdError> {
        self.color.commit()?;
        self.depth.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_hmd::{SimulatedHmd, SimulatedHmdConfig};

    #[test]
    fn viewports_tile_the_target() {
        let mut hmd = SimulatedHmd::new(SimulatedHmdConfig::default());
        let chains = StereoSwapChains::new(
            &mut hmd,
            [Sizei { w: 1000, h: 1100 }, Sizei { w: 1010, h: 1090 }],
        )
        .unwrap();

        let [left, right] = chains.viewports();
        let target = chains.target_size();

        assert_eq!(target, Sizei { w: 2020, h: 1100 });
        assert_eq!(left.x, 0);
        assert_eq!(left.right(), right.x);
        assert_eq!(right.right(), target.w as i32);
        assert!(!left.intersects(&right));
        assert_eq!(left.area() + right.area(), target.w as u64 * target.h as u64);
        assert_eq!(chains.split_x(), 1010);
    }

    #[test]
    fn commit_advances_both_chains() {
        let mut hmd = SimulatedHmd::new(SimulatedHmdConfig::default());
        let mut chains =
            StereoSwapChains::new(&mut hmd, [Sizei { w: 8, h: 8 }; EYE_COUNT]).unwrap();

        assert_eq!(chains.image().color_index, 0);
        chains.commit().unwrap();

        let image = chains.image();
        assert_eq!((image.color_index, image.depth_index), (1, 1));
        assert_eq!(chains.color_desc().format, SwapChainFormat::Rgba8UnormSrgb);
        assert_eq!(chains.depth_desc().format, SwapChainFormat::Depth32Float);
    }

    #[test]
    fn dropping_releases_both_chains() {
        let mut hmd = SimulatedHmd::new(SimulatedHmdConfig::default());
        let handle = hmd.handle();

        let chains = StereoSwapChains::new(&mut hmd, [Sizei { w: 8, h: 8 }; EYE_COUNT]).unwrap();
        assert_eq!(handle.live_swap_chains(), 2);

        drop(chains);
        assert_eq!(handle.live_swap_chains(), 0);
    }
}
