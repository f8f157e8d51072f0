use lib_gpu::{
    CommandEncoderDescriptor, DepthTarget, LoadOp, Operations, RenderPassColorAttachment,
    RenderPassDepthStencilAttachment, RenderPassDescriptor, StoreOp, TextureFormat, TextureView,
};
use lib_hmd::Recti;

use crate::{
    camera::Camera,
    renderer::{CLEAR_COLOR, DrawList, RenderContext, Renderer, plan_mono},
    scene::Scene,
};

impl Renderer {
    /// Records every pass of `list` into one command buffer and submits it.
    ///
    /// Panics if the list holds more passes or draws than the constant
    /// buffers were sized for.
    pub fn execute(
        &mut self,
        list: &DrawList,
        color: &TextureView,
        color_format: TextureFormat,
        depth: &TextureView,
        ctx: RenderContext,
    ) {
        let pipeline_index = self.ensure_pipeline(color_format, ctx.device);

        let per_frame = list
            .passes
            .iter()
            .map(|pass| pass.per_frame)
            .collect::<Vec<_>>();
        let per_draw = list
            .passes
            .iter()
            .flat_map(|pass| pass.draws.iter().map(|draw| draw.per_draw))
            .collect::<Vec<_>>();

        self.per_frame_buf.write(&per_frame, ctx.queue);
        self.per_draw_buf.write(&per_draw, ctx.queue);

        let mut encoder = ctx
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("renderer command encoder"),
            });

        let mut draw_slot = 0;

        for (pass_slot, plan) in list.passes.iter().enumerate() {
            let color_load = match plan.clear {
                true => LoadOp::Clear(CLEAR_COLOR),
                false => LoadOp::Load,
            };
            let depth_load = match plan.clear {
                true => LoadOp::Clear(1.0),
                false => LoadOp::Load,
            };

            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some(plan.label),
                timestamp_writes: None,
                occlusion_query_set: None,
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: depth,
                    depth_ops: Some(Operations {
                        load: depth_load,
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: color,
                    depth_slice: None,
                    ops: Operations {
                        load: color_load,
                        store: StoreOp::Store,
                    },
                    resolve_target: None,
                })],
            });

            let Recti { x, y, w, h } = plan.viewport;
            pass.set_viewport(x as f32, y as f32, w as f32, h as f32, 0.0, 1.0);
            pass.set_scissor_rect(x.max(0) as u32, y.max(0) as u32, w, h);

            pass.set_pipeline(&self.pipelines[pipeline_index].1);
            pass.set_bind_group(1, &self.material_bind_group, &[]);

            let frame_offset = self.per_frame_buf.offset(pass_slot);

            for draw in &plan.draws {
                pass.set_bind_group(
                    0,
                    &self.constants_bind_group,
                    &[frame_offset, self.per_draw_buf.offset(draw_slot)],
                );
                self.mesh(draw.mesh).draw(&mut pass, plan.instance_count);

                draw_slot += 1;
            }
        }

        ctx.queue.submit([encoder.finish()]);
    }

    /// Draws the scene straight to the window, as seen by `camera`.
    pub fn render_mono(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        output: &TextureView,
        output_size: (u32, u32),
        ctx: RenderContext,
    ) {
        let (width, height) = output_size;

        if self
            .window_depth
            .as_ref()
            .is_none_or(|depth| depth.size() != (width.max(1), height.max(1)))
        {
            self.window_depth = Some(DepthTarget::new(
                "renderer window depth texture",
                width,
                height,
                ctx.device,
            ));
        }

        let list = plan_mono(scene, camera, Recti::new(0, 0, width, height));

        // Taken out for the duration of the call so `execute` can borrow
        // `self` mutably.
        let Some(depth) = self.window_depth.take() else {
            return;
        };
        self.execute(&list, output, ctx.surface_format, depth.view(), ctx);
        self.window_depth = Some(depth);
    }
}
