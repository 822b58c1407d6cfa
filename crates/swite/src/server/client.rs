// Copyright (c) 2025-2026 Swite and contributors

// SPDX-License-Identifier: MIT
// Third-party contributions licensed under DCO

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to
// deal in the Software without restriction, including without limitation the
// rights to use, copy, modify, merge, publish, distribute, sublicense, and/or
// sell copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NON-INFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS
// IN THE SOFTWARE.

// ----------------------------------------------------------------------------

//! Push channel client.

/// Push channel client script.
///
/// The script connects to the WebSocket server and listens for update
/// payloads. Stylesheet updates swap the matching `link` tag in place,
/// hot updates re-import the changed module with a cache-busting query
/// parameter, and everything else reloads the document. The connection
/// retries every second; a successful reconnect forces a reload, since
/// updates may have been missed while disconnected.
pub static CLIENT: &str = concat!(
    "(() => {\n",
    "  let closed = false;\n",
    "  function connect() {\n",
    "    const socket = new WebSocket(`ws://${window.location.host}`);\n",
    "    socket.addEventListener(\"message\", ev => {\n",
    "      let update;\n",
    "      try { update = JSON.parse(ev.data) } catch { return }\n",
    "      if (update.type !== \"update\") return;\n",
    "      if (update.updateType === \"style\") {\n",
    "        const file = update.path.split(\"/\").pop();\n",
    "        document.querySelectorAll(`link[rel=\"stylesheet\"]`)\n",
    "          .forEach(link => {\n",
    "            if (!link.href.includes(file)) return;\n",
    "            const next = link.cloneNode(true);\n",
    "            next.href = link.href.split(\"?\")[0] +\n",
    "              `?t=${update.timestamp}`;\n",
    "            next.addEventListener(\"load\", () => {\n",
    "              link.parentNode.removeChild(link)\n",
    "            });\n",
    "            link.parentNode.insertBefore(next, link.nextSibling)\n",
    "          });\n",
    "        return\n",
    "      }\n",
    "      if (update.updateType === \"hot\") {\n",
    "        import(`${update.path}?t=${update.timestamp}`)\n",
    "          .catch(() => window.location.reload());\n",
    "        return\n",
    "      }\n",
    "      window.location.reload()\n",
    "    });\n",
    "    socket.addEventListener(\"open\", () => {\n",
    "      console.info(`[swite] connected to ${socket.url}`);\n",
    "      if (closed) {\n",
    "        window.location.reload()\n",
    "      }\n",
    "    });\n",
    "    socket.addEventListener(\"close\", () => {\n",
    "      closed = true;\n",
    "      setTimeout(() => connect(), 1000)\n",
    "    })\n",
    "  }\n",
    "  connect()\n",
    "})()\n"
);
