//! The single-page interview client served at `/`.

/// Chat view, stats bar and answer box. The script connects to `/ws` on the
/// same host and sends a summary request when the countdown reaches zero.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Mock Interview</title>
<style>
  body { font-family: system-ui, sans-serif; margin: 0; background: #f4f5f7; color: #1d1f23; }
  header { display: flex; gap: 1.5rem; padding: 0.75rem 1.25rem; background: #1d1f23; color: #f4f5f7; }
  header span b { font-variant-numeric: tabular-nums; }
  #chat { height: calc(100vh - 8rem); overflow-y: auto; padding: 1rem 1.25rem; }
  #chat p { margin: 0 0 0.75rem; padding: 0.6rem 0.8rem; border-radius: 6px; max-width: 48rem; }
  #chat p.q { background: #e3ecfa; }
  #chat p.fb { background: #e4f4e7; }
  #chat p.you { background: #fff; margin-left: auto; }
  #chat p.err { background: #fbe3e3; }
  #input { box-sizing: border-box; width: calc(100% - 2.5rem); margin: 0 1.25rem; padding: 0.7rem; font-size: 1rem; }
</style>
</head>
<body>
<header>
  <span>Level: <b id="level">easy</b></span>
  <span>Answered: <b id="answered">0</b></span>
  <span>Average: <b id="avg">0</b></span>
  <span>Time left: <b id="timer">-</b>s</span>
</header>
<div id="chat"></div>
<input id="input" placeholder="Type your answer and press Enter" autocomplete="off">
<script>
(() => {
  const chat = document.getElementById("chat");
  const input = document.getElementById("input");
  const levelEl = document.getElementById("level");
  const answeredEl = document.getElementById("answered");
  const avgEl = document.getElementById("avg");
  const timerEl = document.getElementById("timer");

  const ws = new WebSocket((location.protocol === "https:" ? "wss://" : "ws://") + location.host + "/ws");
  let countdown = null;

  function append(text, cls) {
    const p = document.createElement("p");
    if (cls) p.className = cls;
    p.textContent = text;
    chat.appendChild(p);
    chat.scrollTop = chat.scrollHeight;
  }

  function send(answer) {
    if (ws.readyState === WebSocket.OPEN) {
      ws.send(JSON.stringify({ type: "answer", answer: answer }));
    }
  }

  function startTimer(seconds) {
    clearInterval(countdown);
    timerEl.textContent = seconds;
    countdown = setInterval(() => {
      seconds -= 1;
      timerEl.textContent = seconds;
      if (seconds <= 0) {
        clearInterval(countdown);
        send("Time's up, please summarise");
      }
    }, 1000);
  }

  ws.onmessage = (event) => {
    const msg = JSON.parse(event.data);

    if (msg.type === "question") {
      append("(" + msg.level + ") " + msg.category.toUpperCase() + " Q: " + msg.text, "q");
      startTimer(msg.time);
    } else if (msg.type === "feedback") {
      append("Score " + msg.score + "/5: " + msg.explanation, "fb");
    } else if (msg.type === "error") {
      clearInterval(countdown);
      append(msg.message, "err");
    }

    if (msg.stats) {
      levelEl.textContent = msg.stats.level;
      answeredEl.textContent = msg.stats.answered;
      avgEl.textContent = msg.stats.answered
        ? (msg.stats.total_score / msg.stats.answered).toFixed(2)
        : 0;
    }
  };

  ws.onclose = () => {
    clearInterval(countdown);
    input.disabled = true;
    append("Session ended.", "err");
  };

  input.addEventListener("keydown", (e) => {
    const answer = input.value.trim();
    if (e.key === "Enter" && answer !== "") {
      append("You: " + answer, "you");
      send(answer);
      input.value = "";
      clearInterval(countdown);
    }
  });
})();
</script>
</body>
</html>
"##;
