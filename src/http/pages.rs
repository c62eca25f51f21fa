//! Inline HTML bodies for the submit handler and the 404 fallback.

pub const SUBMIT_SUCCESS: &str = r#"<!DOCTYPE html>
<html lang="uk">
<head>
    <meta charset="UTF-8">
    <title>Повідомлення надіслано</title>
</head>
<body>
    <h1>Дані успішно записані!</h1>
    <a href="/message">Надіслати нове повідомлення</a>
</body>
</html>
"#;

pub const SUBMIT_FAILURE: &str = r#"<!DOCTYPE html>
<html lang="uk">
<head>
    <meta charset="UTF-8">
    <title>Помилка збереження</title>
</head>
<body>
    <h1>Дані не можуть бути записані!</h1>
    <a href="/message">Спробувати ще раз</a>
</body>
</html>
"#;

pub const SERVER_ERROR: &str = r#"<!DOCTYPE html>
<html lang="uk">
<head>
    <meta charset="UTF-8">
    <title>Помилка сервера</title>
</head>
<body>
    <h1>Сталася помилка на сервері</h1>
    <p>Будь ласка, спробуйте пізніше.</p>
</body>
</html>
"#;

/// Served when `templates/error.html` cannot be read.
pub const NOT_FOUND_FALLBACK: &str = "<h1>404 Not Found</h1>";
