// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `glow-triangle`.
//
// `glow-triangle` is free software: you can redistribute it and/or modify it under the
// terms of either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
//   version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `glow-triangle` is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE. See the GNU Lesser General Public License or the Mozilla Public License for more
// details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `glow-triangle`. If not, see <https://www.gnu.org/licenses/>.

use glow_triangle::{GlutinSetup, RenderConfig};

use winit::event_loop::EventLoop;

fn main() {
    tracing_subscriber::fmt::init();

    let config = RenderConfig::default();
    let event_loop = EventLoop::new();

    let setup = match GlutinSetup::new(&event_loop, &config) {
        Ok(setup) => setup,
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(-1);
        }
    };

    setup.run(event_loop)
}
