// src/server/inject.rs

//! Live-reload client script injected into served HTML.

use crate::server::RELOAD_PATH;

const CLIENT_TEMPLATE: &str = r#"<script>
(function () {
  var notify = __NOTIFY__;
  var endpoint = (location.protocol === "https:" ? "wss://" : "ws://") + location.host + "__PATH__";
  function toast(text) {
    if (!notify || !document.body) return;
    var el = document.createElement("div");
    el.textContent = text;
    el.style.cssText = "position:fixed;top:0;right:0;z-index:2147483647;padding:8px 14px;" +
      "background:#1b1b1b;color:#fff;font:13px sans-serif;border-bottom-left-radius:4px";
    document.body.appendChild(el);
    setTimeout(function () { el.remove(); }, 1500);
  }
  function refreshCss(paths) {
    document.querySelectorAll('link[rel="stylesheet"]').forEach(function (link) {
      var url = new URL(link.href);
      if (paths.length && paths.indexOf(url.pathname) === -1) return;
      url.searchParams.set("assetpipe", Date.now());
      link.href = url.toString();
    });
  }
  function connect() {
    var ws = new WebSocket(endpoint);
    ws.onmessage = function (ev) {
      var msg = JSON.parse(ev.data);
      if (msg.type === "css") { toast("Injected: CSS"); refreshCss(msg.paths || []); }
      else if (msg.type === "reload") { toast("Reloading..."); location.reload(); }
    };
    ws.onclose = function () { setTimeout(connect, 1000); };
  }
  connect();
})();
</script>"#;

pub fn client_script(notify: bool) -> String {
    CLIENT_TEMPLATE
        .replace("__NOTIFY__", if notify { "true" } else { "false" })
        .replace("__PATH__", RELOAD_PATH)
}

/// Insert the client script before the last `</body>` (any case), or append
/// it when the document has none.
pub fn inject_client(html: &str, notify: bool) -> String {
    let script = client_script(notify);
    let lower = html.to_ascii_lowercase();

    match lower.rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + script.len());
            out.push_str(&html[..idx]);
            out.push_str(&script);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{html}{script}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_goes_before_closing_body() {
        let html = "<html><BODY><h1>x</h1></BODY></html>";
        let out = inject_client(html, true);
        let script_at = out.find("<script>").unwrap();
        assert!(script_at < out.find("</BODY>").unwrap());
        assert!(out.contains("/__assetpipe/reload"));
        assert!(out.contains("var notify = true;"));
    }

    #[test]
    fn fragments_get_script_appended() {
        let out = inject_client("<p>partial</p>", false);
        assert!(out.starts_with("<p>partial</p><script>"));
        assert!(out.contains("var notify = false;"));
    }
}
