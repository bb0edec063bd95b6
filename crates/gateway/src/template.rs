//! # 署名用文書テンプレート
//!
//! 署名者名・メールアドレスを差し込んだHTML文書を生成する。
//! 白文字のアンカー `**signature_1**`, `**signature_2**` の位置にプロバイダが署名欄を置く。
//! アンカーは2つ固定のため、3名以上の署名者には使えない。

/// Base64エンジン（Standard）
pub(crate) fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// 文書HTMLを生成する。
pub fn render_document(signer_name: &str, signer_email: &str) -> String {
    let name = escape_html(signer_name);
    let email = escape_html(signer_email);
    format!(
        r#"
    <!DOCTYPE html>
    <html>
        <head>
        <meta charset="UTF-8">
        </head>
        <body style="font-family:sans-serif;margin-left:2em;">
        <h1 style="font-family: 'Trebuchet MS', Helvetica, sans-serif;
            color: darkblue;margin-bottom: 0;">World Wide Corp</h1>
        <h2 style="font-family: 'Trebuchet MS', Helvetica, sans-serif;
        margin-top: 0px;margin-bottom: 3.5em;font-size: 1em;
        color: darkblue;">Order Processing Division</h2>
        <h4>Ordered by {name}</h4>
        <p style="margin-top:0em; margin-bottom:0em;">Email: {email}</p>
        <p style="margin-top:3em;">Candy bonbon pastry jujubes lollipop wafer biscuit biscuit. Topping brownie sesame snaps sweet roll pie. Croissant danish biscuit soufflé caramels jujubes jelly. Dragée danish caramels lemon drops dragée. Gummi bears cupcake biscuit tiramisu sugar plum pastry. Dragée gummies applicake pudding liquorice. Donut jujubes oat cake jelly-o. Dessert bear claw chocolate cake gummies lollipop sugar plum ice cream gummies cheesecake.</p>
        <h3 style="margin-top:3em;">Agreed (SA): <span style="color:white;">**signature_1**/</span></h3>
        <h3 style="margin-top:3em;">Agreed (Caregiver): <span style="color:white;">**signature_2**/</span></h3>
        </body>
    </html>
  "#
    )
}
